//! JUnit XML test reports, addressed by report url.

use std::sync::Arc;

use chrono::NaiveDateTime;
use hq_model::SourceKind;
use hq_model::parse::parse_iso_datetime;
use tracing::warn;

use crate::error::{Result, SourceError};
use crate::opener::UrlRead;
use crate::source::{MetricSource, TestCounts, TestReport};
use crate::xml::Element;

pub struct JunitTestReport {
    url: String,
    opener: Arc<dyn UrlRead>,
}

impl JunitTestReport {
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

/// The test suites of a report with a `testsuite` or `testsuites` root.
fn suites(root: &Element) -> Vec<&Element> {
    if root.name == "testsuite" {
        vec![root]
    } else {
        root.children_named("testsuite").collect()
    }
}

fn sum_attribute(suites: &[&Element], attribute: &str) -> Result<i64> {
    suites.iter().try_fold(0, |total, suite| {
        let value = match suite.attr(attribute) {
            Some(value) => value
                .trim()
                .parse::<i64>()
                .map_err(|err| SourceError::Parse(format!("{attribute}: {err}")))?,
            None => 0,
        };
        Ok(total + value)
    })
}

/// Counts the tests in a parsed report.
pub fn count_tests(root: &Element) -> Result<TestCounts> {
    let suites = suites(root);
    if suites.is_empty() {
        return Err(SourceError::Parse("no test suites in report".to_string()));
    }
    let failures = root
        .descendants("testcase")
        .into_iter()
        .filter(|case| case.child("failure").is_some())
        .count() as i64;
    let failed = failures + sum_attribute(&suites, "errors")?;
    let skipped = sum_attribute(&suites, "skipped")? + sum_attribute(&suites, "disabled")?;
    let total = sum_attribute(&suites, "tests")?;
    Ok(TestCounts {
        passed: total - skipped - failed,
        failed,
        skipped,
    })
}

/// The earliest suite timestamp of a parsed report.
pub fn report_timestamp(root: &Element) -> Result<NaiveDateTime> {
    suites(root)
        .into_iter()
        .filter_map(|suite| suite.attr("timestamp"))
        .filter_map(parse_iso_datetime)
        .min()
        .ok_or_else(|| SourceError::Parse("no timestamps in test suites".to_string()))
}

impl MetricSource for JunitTestReport {
    fn kind(&self) -> SourceKind {
        SourceKind::Junit
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn metric_source_urls(&self, ids: &[&str]) -> Vec<String> {
        ids.iter()
            .map(|id| match id.strip_suffix("junit/junit.xml") {
                Some(base) => format!("{base}html/htmlReport.html"),
                None => (*id).to_string(),
            })
            .collect()
    }
}

impl TestReport for JunitTestReport {
    fn test_counts(&self, id: &str) -> Result<TestCounts> {
        count_tests(&self.root(id)?)
    }

    fn report_datetime(&self, id: &str) -> Result<NaiveDateTime> {
        report_timestamp(&self.root(id)?).inspect_err(|_| {
            warn!(report_url = %id, "Couldn't find timestamps in test suites");
        })
    }
}
