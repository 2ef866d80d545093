//! TestNG `testng-results.xml` reports, addressed by report url.

use std::sync::Arc;

use chrono::NaiveDateTime;
use hq_model::SourceKind;
use hq_model::parse::parse_iso_datetime;
use tracing::warn;

use crate::error::{Result, SourceError};
use crate::opener::UrlRead;
use crate::source::{MetricSource, TestCounts, TestReport};
use crate::xml::Element;

pub struct TestNgReport {
    url: String,
    opener: Arc<dyn UrlRead>,
}

impl TestNgReport {
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

fn count(root: &Element, attribute: &str) -> Result<i64> {
    root.attr(attribute)
        .ok_or_else(|| SourceError::Parse(format!("report has no {attribute} count")))?
        .trim()
        .parse()
        .map_err(|err| SourceError::Parse(format!("{attribute}: {err}")))
}

/// Counts from the attributes of the results root.
pub fn count_tests(root: &Element) -> Result<TestCounts> {
    Ok(TestCounts {
        passed: count(root, "passed")?,
        failed: count(root, "failed")?,
        skipped: count(root, "skipped")?,
    })
}

/// Start of the earliest suite.
pub fn report_timestamp(root: &Element) -> Result<NaiveDateTime> {
    root.children_named("suite")
        .filter_map(|suite| suite.attr("started-at"))
        .filter_map(parse_iso_datetime)
        .min()
        .ok_or_else(|| SourceError::Parse("no suite start times in report".to_string()))
}

impl MetricSource for TestNgReport {
    fn kind(&self) -> SourceKind {
        SourceKind::Testng
    }

    fn url(&self) -> &str {
        &self.url
    }
}

impl TestReport for TestNgReport {
    fn test_counts(&self, id: &str) -> Result<TestCounts> {
        count_tests(&self.root(id)?)
    }

    fn report_datetime(&self, id: &str) -> Result<NaiveDateTime> {
        report_timestamp(&self.root(id)?).inspect_err(|_| {
            warn!(report_url = %id, "Couldn't find timestamps in test suites");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earliest_suite_start_is_used() {
        let root = Element::parse(
            r#"<testng-results skipped="1" failed="2" total="10" passed="7">
              <suite name="b" started-at="2024-05-02T09:00:00Z"/>
              <suite name="a" started-at="2024-05-02T08:15:00Z"/>
            </testng-results>"#,
        )
        .expect("xml");
        assert_eq!(count_tests(&root).expect("counts").total(), 10);
        assert_eq!(
            report_timestamp(&root).expect("date").to_string(),
            "2024-05-02 08:15:00"
        );
    }

    #[test]
    fn missing_counts_are_an_error() {
        let root = Element::parse(r#"<testng-results passed="3"/>"#).expect("xml");
        assert!(count_tests(&root).is_err());
        assert!(report_timestamp(&root).is_err());
    }
}
