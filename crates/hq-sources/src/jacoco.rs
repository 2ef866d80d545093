//! JaCoCo HTML coverage reports, addressed by the url of `index.html`.
//!
//! The footer row of the report holds "missed of total" per counter. The
//! session page next to the report lists when coverage was collected.

use std::sync::Arc;

use chrono::NaiveDateTime;
use hq_model::SourceKind;
use hq_model::parse::{parse_abbreviated_datetime, parse_us_datetime};
use tracing::warn;

use crate::error::{Result, SourceError};
use crate::html;
use crate::opener::UrlRead;
use crate::source::{CoverageReport, MetricSource};

const STATEMENT_COLUMN: usize = 1;
const BRANCH_COLUMN: usize = 3;

pub struct JacocoReport {
    url: String,
    opener: Arc<dyn UrlRead>,
}

impl JacocoReport {
    pub fn new(url: &str, opener: Arc<dyn UrlRead>) -> Self {
        Self {
            url: url.to_string(),
            opener,
        }
    }

    fn coverage(&self, report_url: &str, column: usize) -> Result<f64> {
        let report = self.opener.url_read(report_url)?;
        parse_coverage(&report, column).inspect_err(|err| {
            warn!(%report_url, reason = %err, "Couldn't parse JaCoCo report");
        })
    }
}

/// Urls of the session page, newest JaCoCo layout first.
pub fn session_urls(report_url: &str) -> [String; 2] {
    let base = report_url.strip_suffix("index.html").unwrap_or(report_url);
    [format!("{base}jacoco-sessions.html"), format!("{base}.sessions.html")]
}

fn parse_count(text: &str) -> Result<i64> {
    text.trim()
        .parse()
        .map_err(|err| SourceError::Parse(format!("coverage count '{text}': {err}")))
}

/// Coverage percentage of the footer counter in `column`.
pub fn parse_coverage(report: &str, column: usize) -> Result<f64> {
    let footer = html::element(report, "tfoot")
        .ok_or_else(|| SourceError::Parse("no totals in JaCoCo report".to_string()))?;
    let cells = html::cells(footer)?;
    let counter = cells
        .get(column)
        .ok_or_else(|| SourceError::Parse(format!("no coverage counter in column {column}")))?
        .replace([',', '.'], "");
    let (missed, total) = counter
        .split_once(" of ")
        .ok_or_else(|| SourceError::Parse(format!("unexpected coverage counter '{counter}'")))?;
    let (missed, total) = (parse_count(missed)?, parse_count(total)?);
    if total > 0 {
        Ok(100.0 * (total - missed) as f64 / total as f64)
    } else {
        Ok(0.0)
    }
}

/// Start of the most recent session.
pub fn parse_session_date(sessions: &str) -> Result<NaiveDateTime> {
    let body = html::element(sessions, "tbody")
        .ok_or_else(|| SourceError::Parse("no session table in JaCoCo report".to_string()))?;
    html::rows(body)?
        .iter()
        .filter_map(|row| row.get(2))
        .filter_map(|text| parse_us_datetime(text).or_else(|| parse_abbreviated_datetime(text)))
        .max()
        .ok_or_else(|| SourceError::Parse("no session dates in JaCoCo report".to_string()))
}

impl MetricSource for JacocoReport {
    fn kind(&self) -> SourceKind {
        SourceKind::Jacoco
    }

    fn url(&self) -> &str {
        &self.url
    }
}

impl CoverageReport for JacocoReport {
    fn statement_coverage(&self, id: &str) -> Result<f64> {
        self.coverage(id, STATEMENT_COLUMN)
    }

    fn branch_coverage(&self, id: &str) -> Result<f64> {
        self.coverage(id, BRANCH_COLUMN)
    }

    fn coverage_datetime(&self, id: &str) -> Result<NaiveDateTime> {
        let mut last_error = SourceError::NoIds;
        for url in session_urls(id) {
            match self.opener.url_read(&url) {
                Ok(sessions) => return parse_session_date(&sessions),
                Err(err) => last_error = err,
            }
        }
        warn!(report_url = %id, reason = %last_error, "Couldn't read JaCoCo sessions");
        Err(last_error)
    }
}
