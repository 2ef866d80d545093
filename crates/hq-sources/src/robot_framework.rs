//! Robot Framework `output.xml` reports, addressed by report url.

use std::sync::Arc;

use chrono::NaiveDateTime;
use hq_model::SourceKind;
use hq_model::parse::parse_iso_datetime;
use tracing::warn;

use crate::error::{Result, SourceError};
use crate::opener::UrlRead;
use crate::source::{MetricSource, TestCounts, TestReport};
use crate::xml::Element;

pub struct RobotFrameworkReport {
    url: String,
    opener: Arc<dyn UrlRead>,
}

impl RobotFrameworkReport {
    pub fn new(url: &str, opener: Arc<dyn UrlRead>) -> Self {
        Self {
            url: url.to_string(),
            opener,
        }
    }

    fn root(&self, report_url: &str) -> Result<Element> {
        let contents = self.opener.url_read(report_url)?;
        Element::parse(&contents).inspect_err(|err| {
            warn!(%report_url, reason = %err, "Couldn't parse report");
        })
    }
}

fn count(stat: &Element, attribute: &str) -> Result<i64> {
    stat.attr(attribute)
        .unwrap_or("0")
        .trim()
        .parse()
        .map_err(|err| SourceError::Parse(format!("{attribute}: {err}")))
}

/// Counts from the "All Tests" statistic, the last one of the totals.
pub fn count_tests(root: &Element) -> Result<TestCounts> {
    let stat = root
        .child("statistics")
        .and_then(|statistics| statistics.child("total"))
        .and_then(|total| total.children_named("stat").last())
        .ok_or_else(|| SourceError::Parse("no total statistics in report".to_string()))?;
    Ok(TestCounts {
        passed: count(stat, "pass")?,
        failed: count(stat, "fail")?,
        skipped: count(stat, "skip")?,
    })
}

/// When the report was generated: "20240502 08:15:00.123" or ISO.
pub fn generated(root: &Element) -> Result<NaiveDateTime> {
    let text = root
        .attr("generated")
        .ok_or_else(|| SourceError::Parse("report has no generation date".to_string()))?;
    NaiveDateTime::parse_from_str(text.trim(), "%Y%m%d %H:%M:%S%.f")
        .ok()
        .or_else(|| parse_iso_datetime(text))
        .ok_or_else(|| SourceError::Parse(format!("generation date '{text}'")))
}

impl MetricSource for RobotFrameworkReport {
    fn kind(&self) -> SourceKind {
        SourceKind::RobotFramework
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn metric_source_urls(&self, ids: &[&str]) -> Vec<String> {
        ids.iter()
            .map(|id| match id.strip_suffix("output.xml") {
                Some(base) => format!("{base}report.html"),
                None => (*id).to_string(),
            })
            .collect()
    }
}

impl TestReport for RobotFrameworkReport {
    fn test_counts(&self, id: &str) -> Result<TestCounts> {
        count_tests(&self.root(id)?)
    }

    fn report_datetime(&self, id: &str) -> Result<NaiveDateTime> {
        generated(&self.root(id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_come_from_all_tests() {
        let root = Element::parse(
            r#"<robot generated="20240502 08:15:00.123">
              <statistics><total>
                <stat pass="3" fail="1">Critical Tests</stat>
                <stat pass="5" fail="2">All Tests</stat>
              </total></statistics>
            </robot>"#,
        )
        .expect("xml");
        assert_eq!(
            count_tests(&root).expect("counts"),
            TestCounts {
                passed: 5,
                failed: 2,
                skipped: 0
            }
        );
        assert_eq!(generated(&root).expect("date").to_string(), "2024-05-02 08:15:00.123");
    }

    #[test]
    fn newer_reports_use_iso_dates() {
        let root =
            Element::parse(r#"<robot generated="2024-05-02T08:15:00.123456"/>"#).expect("xml");
        assert_eq!(generated(&root).expect("date").to_string(), "2024-05-02 08:15:00");
        assert!(count_tests(&root).is_err());
    }
}
