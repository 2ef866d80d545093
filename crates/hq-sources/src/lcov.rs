//! LCOV (genhtml) coverage reports, addressed by report url.
//!
//! The header table of the report has a label cell per counter, followed by
//! the hit and total numbers, and a "Date:" cell followed by the test date.

use std::sync::Arc;

use chrono::NaiveDateTime;
use hq_model::SourceKind;
use hq_model::parse::parse_sql_datetime;
use tracing::warn;

use crate::error::{Result, SourceError};
use crate::html;
use crate::opener::UrlRead;
use crate::source::{CoverageReport, MetricSource};

pub struct LcovReport {
    url: String,
    opener: Arc<dyn UrlRead>,
}

impl LcovReport {
    pub fn new(url: &str, opener: Arc<dyn UrlRead>) -> Self {
        Self {
            url: url.to_string(),
            opener,
        }
    }

    fn read<T>(&self, report_url: &str, parse: impl Fn(&[String]) -> Result<T>) -> Result<T> {
        let report = self.opener.url_read(report_url)?;
        parse(&html::cells(&report)?).inspect_err(|err| {
            warn!(%report_url, reason = %err, "Couldn't parse LCOV report");
        })
    }
}

fn after_header<'a>(cells: &'a [String], header: &str, offset: usize) -> Result<&'a str> {
    let index = cells
        .iter()
        .position(|cell| cell == header)
        .ok_or_else(|| SourceError::Parse(format!("header {header} not found in report")))?;
    cells
        .get(index + offset)
        .map(String::as_str)
        .ok_or_else(|| SourceError::Parse(format!("no data after header {header}")))
}

/// Percentage of hit items for a counter such as "Lines:".
pub fn coverage_percentage(cells: &[String], header: &str) -> Result<f64> {
    let number = |offset| -> Result<i64> {
        let text = after_header(cells, header, offset)?;
        text.parse()
            .map_err(|err| SourceError::Parse(format!("{header} '{text}': {err}")))
    };
    let (hit, total) = (number(1)?, number(2)?);
    if total == 0 {
        return Err(SourceError::Parse(format!("total number of {header} is zero")));
    }
    Ok(100.0 * hit as f64 / total as f64)
}

/// Date the coverage was measured.
pub fn coverage_date(cells: &[String]) -> Result<NaiveDateTime> {
    let text = after_header(cells, "Date:", 1)?;
    parse_sql_datetime(text).ok_or_else(|| SourceError::Parse(format!("report date '{text}'")))
}

impl MetricSource for LcovReport {
    fn kind(&self) -> SourceKind {
        SourceKind::Lcov
    }

    fn url(&self) -> &str {
        &self.url
    }
}

impl CoverageReport for LcovReport {
    fn statement_coverage(&self, id: &str) -> Result<f64> {
        self.read(id, |cells| coverage_percentage(cells, "Lines:"))
    }

    fn branch_coverage(&self, id: &str) -> Result<f64> {
        self.read(id, |cells| coverage_percentage(cells, "Branches:"))
    }

    fn coverage_datetime(&self, id: &str) -> Result<NaiveDateTime> {
        self.read(id, coverage_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|text| (*text).to_string()).collect()
    }

    #[test]
    fn zero_total_is_an_error() {
        let cells = cells(&["Branches:", "0", "0", "-"]);
        assert!(coverage_percentage(&cells, "Branches:").is_err());
        assert!(coverage_percentage(&cells, "Lines:").is_err());
    }

    #[test]
    fn date_follows_its_label() {
        let cells = cells(&["Date:", "2024-05-02 08:15:00", "Lines:", "3", "4"]);
        assert_eq!(
            coverage_date(&cells).expect("date").to_string(),
            "2024-05-02 08:15:00"
        );
        assert_eq!(coverage_percentage(&cells, "Lines:").expect("coverage"), 75.0);
    }
}
