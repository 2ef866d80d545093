//! Capabilities shared by several adapters.

use chrono::NaiveDateTime;
use hq_model::SourceKind;
use serde::Serialize;

use crate::error::{Result, SourceError};

/// Any configured external system.
pub trait MetricSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Base url of the system.
    fn url(&self) -> &str;

    /// Urls a reader can follow for the given ids.
    fn metric_source_urls(&self, ids: &[&str]) -> Vec<String> {
        if ids.is_empty() {
            vec![self.url().to_string()]
        } else {
            ids.iter().map(|id| (*id).to_string()).collect()
        }
    }
}

/// Number of tests per outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TestCounts {
    pub passed: i64,
    pub failed: i64,
    pub skipped: i64,
}

impl TestCounts {
    pub fn total(&self) -> i64 {
        self.passed + self.failed + self.skipped
    }
}

impl std::ops::Add for TestCounts {
    type Output = TestCounts;

    fn add(self, other: TestCounts) -> TestCounts {
        TestCounts {
            passed: self.passed + other.passed,
            failed: self.failed + other.failed,
            skipped: self.skipped + other.skipped,
        }
    }
}

/// A source of test results, addressed by report id.
pub trait TestReport: MetricSource {
    /// Test counts of a single report.
    fn test_counts(&self, id: &str) -> Result<TestCounts>;

    /// When a single report was produced.
    fn report_datetime(&self, id: &str) -> Result<NaiveDateTime>;

    /// Resolves pattern ids into concrete report ids.
    fn expand_ids(&self, ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| (*id).to_string()).collect()
    }

    /// Counts summed over all reports.
    fn total_test_counts(&self, ids: &[&str]) -> Result<TestCounts> {
        let ids = self.expand_ids(ids);
        if ids.is_empty() {
            return Err(SourceError::NoIds);
        }
        ids.iter()
            .try_fold(TestCounts::default(), |total, id| Ok(total + self.test_counts(id)?))
    }

    /// Date of the oldest report.
    fn oldest_report_datetime(&self, ids: &[&str]) -> Result<NaiveDateTime> {
        let ids = self.expand_ids(ids);
        let mut oldest: Option<NaiveDateTime> = None;
        for id in &ids {
            let datetime = self.report_datetime(id)?;
            oldest = Some(oldest.map_or(datetime, |current| current.min(datetime)));
        }
        oldest.ok_or(SourceError::NoIds)
    }
}

/// A coverage report, addressed by report url.
pub trait CoverageReport: MetricSource {
    /// Percentage of statements covered.
    fn statement_coverage(&self, id: &str) -> Result<f64>;

    /// Percentage of branches covered.
    fn branch_coverage(&self, id: &str) -> Result<f64>;

    /// When the coverage was measured.
    fn coverage_datetime(&self, id: &str) -> Result<NaiveDateTime>;
}

/// A CI job with the age in days of its relevant build, when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobInfo {
    pub name: String,
    pub url: String,
    pub days: Option<i64>,
}

impl JobInfo {
    /// Age for display, "?" when unknown.
    pub fn days_label(&self) -> String {
        self.days
            .map_or_else(|| "?".to_string(), |days| days.to_string())
    }
}

/// A build server with jobs.
pub trait CiServer: MetricSource {
    fn number_of_active_jobs(&self, ids: &[&str]) -> Result<usize>;

    /// Active jobs whose last stable build is more than a day old.
    fn failing_jobs(&self, ids: &[&str], now: NaiveDateTime) -> Result<Vec<JobInfo>>;

    /// Active jobs that did not complete a build within their grace period.
    fn unused_jobs(&self, ids: &[&str], now: NaiveDateTime) -> Result<Vec<JobInfo>>;
}
