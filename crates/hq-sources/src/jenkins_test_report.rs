//! Test results published by Jenkins jobs.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDateTime;
use hq_model::SourceKind;
use hq_model::format::url_join;
use hq_model::parse::from_timestamp_millis;
use regex::Regex;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{Result, SourceError};
use crate::jenkins::Jenkins;
use crate::opener::{UrlRead, read_json};
use crate::source::{MetricSource, TestCounts, TestReport};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TestResult {
    pass_count: Option<i64>,
    total_count: Option<i64>,
    #[serde(default)]
    fail_count: i64,
    #[serde(default)]
    skip_count: i64,
}

#[derive(Debug, Deserialize)]
struct BuildInfo {
    timestamp: i64,
}

pub struct JenkinsTestReport {
    jenkins: Jenkins,
    opener: Arc<dyn UrlRead>,
}

impl JenkinsTestReport {
    pub fn new(url: &str, opener: Arc<dyn UrlRead>) -> Self {
        Self {
            jenkins: Jenkins::new(url, None, Arc::clone(&opener)),
            opener,
        }
    }

    /// Reads from the last completed build, falling back to the last
    /// successful one when the completed build has no data.
    fn read_build<T: DeserializeOwned>(&self, job: &str, api: &str) -> Result<T> {
        let completed = url_join(&[self.url(), "job", job, "lastCompletedBuild", api]);
        match read_json(self.opener.as_ref(), &completed) {
            Ok(value) => Ok(value),
            Err(err) => {
                debug!(%job, reason = %err, "Falling back to last successful build");
                let successful = url_join(&[self.url(), "job", job, "lastSuccessfulBuild", api]);
                read_json(self.opener.as_ref(), &successful)
            }
        }
    }

    fn expand_id(&self, id: &str, job_names: &[String]) -> Result<BTreeSet<String>> {
        let pattern = if id.chars().any(|ch| "$^.*?[]".contains(ch)) {
            id.to_string()
        } else {
            format!("^{}$", regex::escape(id))
        };
        let regex = Regex::new(&pattern)?;
        let matching: BTreeSet<String> = job_names
            .iter()
            .filter(|name| regex.is_match(name))
            .cloned()
            .collect();
        if matching.is_empty() {
            warn!(%id, "No Jenkins jobs match metric source id");
            return Ok(BTreeSet::from([id.to_string()]));
        }
        Ok(matching)
    }
}

impl MetricSource for JenkinsTestReport {
    fn kind(&self) -> SourceKind {
        SourceKind::JenkinsTestReport
    }

    fn url(&self) -> &str {
        self.jenkins.url()
    }

    fn metric_source_urls(&self, ids: &[&str]) -> Vec<String> {
        let mut urls: Vec<String> = self
            .expand_ids(ids)
            .iter()
            .map(|id| url_join(&[self.url(), "job", id]))
            .collect();
        urls.sort();
        urls
    }
}

impl TestReport for JenkinsTestReport {
    fn test_counts(&self, id: &str) -> Result<TestCounts> {
        let result: TestResult = self.read_build(id, "testReport/api/json")?;
        let passed = match (result.pass_count, result.total_count) {
            (Some(passed), _) => passed,
            (None, Some(total)) => total - result.skip_count - result.fail_count,
            (None, None) => {
                return Err(SourceError::Parse(format!("no test counts for job {id}")));
            }
        };
        Ok(TestCounts {
            passed,
            failed: result.fail_count,
            skipped: result.skip_count,
        })
    }

    fn report_datetime(&self, id: &str) -> Result<NaiveDateTime> {
        let build: BuildInfo = self.read_build(id, "api/json")?;
        from_timestamp_millis(build.timestamp)
            .ok_or_else(|| SourceError::Parse(format!("invalid timestamp for job {id}")))
    }

    /// Ids containing regex characters expand to all matching job names.
    fn expand_ids(&self, ids: &[&str]) -> Vec<String> {
        let jobs = match self.jenkins.all_jobs() {
            Ok(jobs) => jobs,
            Err(err) => {
                warn!(reason = %err, "Couldn't list Jenkins jobs to expand ids");
                return ids.iter().map(|id| (*id).to_string()).collect();
            }
        };
        let job_names: Vec<String> = jobs
            .iter()
            .filter_map(|job| {
                job.url
                    .trim_end_matches('/')
                    .split_once("/job/")
                    .map(|(_, name)| name.to_string())
            })
            .collect();
        let mut expanded = BTreeSet::new();
        for id in ids {
            match self.expand_id(id, &job_names) {
                Ok(names) => expanded.extend(names),
                Err(err) => {
                    warn!(%id, reason = %err, "Invalid job pattern");
                    expanded.insert((*id).to_string());
                }
            }
        }
        expanded.into_iter().collect()
    }
}
