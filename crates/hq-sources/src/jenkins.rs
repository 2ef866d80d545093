//! Jenkins build server adapter.

use std::sync::{Arc, OnceLock};

use chrono::{NaiveDateTime, TimeDelta};
use hq_model::SourceKind;
use hq_model::parse::from_timestamp_millis;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::opener::{UrlRead, read_json};
use crate::source::{CiServer, JobInfo, MetricSource};

const JOBS_API: &str = "api/json?tree=jobs[name,description,color,url,buildable]";
const BUILDS_API: &str = "api/json?tree=builds[result,building]&depth=1";

/// Days without a completed build before a job counts as unused.
pub const DEFAULT_GRACE_DAYS: i64 = 180;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Job {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    pub url: String,
    #[serde(default)]
    pub buildable: bool,
}

#[derive(Debug, Deserialize)]
struct JobList {
    #[serde(default)]
    jobs: Vec<Job>,
}

#[derive(Debug, Deserialize)]
struct Build {
    result: Option<String>,
    #[serde(default)]
    building: bool,
}

#[derive(Debug, Deserialize)]
struct BuildList {
    #[serde(default)]
    builds: Vec<Build>,
}

#[derive(Debug, Deserialize)]
struct Timestamped {
    timestamp: i64,
}

pub struct Jenkins {
    url: String,
    opener: Arc<dyn UrlRead>,
    job_re: Option<String>,
    jobs: OnceLock<Vec<Job>>,
}

impl Jenkins {
    /// `job_re` filters jobs when no ids are given.
    pub fn new(url: &str, job_re: Option<String>, opener: Arc<dyn UrlRead>) -> Self {
        let url = if url.ends_with('/') {
            url.to_string()
        } else {
            format!("{url}/")
        };
        Self {
            url,
            opener,
            job_re,
            jobs: OnceLock::new(),
        }
    }

    /// All jobs, including jobs nested in folders.
    pub fn all_jobs(&self) -> Result<&[Job]> {
        if let Some(jobs) = self.jobs.get() {
            return Ok(jobs);
        }
        let top: JobList = read_json(self.opener.as_ref(), &format!("{}{JOBS_API}", self.url))?;
        let mut jobs = top.jobs.clone();
        self.collect_subjobs(&top.jobs, &mut jobs);
        Ok(self.jobs.get_or_init(|| jobs))
    }

    fn collect_subjobs(&self, parents: &[Job], found: &mut Vec<Job>) {
        for parent in parents {
            let url = format!("{}{JOBS_API}", with_slash(&parent.url));
            match read_json::<JobList>(self.opener.as_ref(), &quote(&url)) {
                Ok(list) if !list.jobs.is_empty() => {
                    found.extend(list.jobs.iter().cloned());
                    self.collect_subjobs(&list.jobs, found);
                }
                Ok(_) => {}
                Err(err) => debug!(job = %parent.name, reason = %err, "No sub jobs"),
            }
        }
    }

    /// Jobs whose name matches one of the patterns, or the configured
    /// filter when no patterns are given.
    pub fn jobs(&self, patterns: &[&str]) -> Result<Vec<&Job>> {
        let patterns: Vec<&str> = if patterns.is_empty() {
            vec![self.job_re.as_deref().unwrap_or("")]
        } else {
            patterns.to_vec()
        };
        let regexes = patterns
            .iter()
            .map(|pattern| Regex::new(&format!("^(?:{pattern})")))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(self
            .all_jobs()?
            .iter()
            .filter(|job| regexes.iter().any(|regex| regex.is_match(&job.name)))
            .collect())
    }

    fn active_jobs(&self, patterns: &[&str]) -> Result<Vec<&Job>> {
        Ok(self
            .jobs(patterns)?
            .into_iter()
            .filter(|job| job.buildable)
            .collect())
    }

    fn finished_builds(&self, job: &Job) -> Result<Vec<Build>> {
        let url = quote(&format!("{}{BUILDS_API}", with_slash(&job.url)));
        let list: BuildList = read_json(self.opener.as_ref(), &url)?;
        Ok(list.builds.into_iter().filter(|build| !build.building).collect())
    }

    fn has_builds_with(&self, job: &Job, results: &[&str]) -> Result<bool> {
        Ok(self.finished_builds(job)?.iter().any(|build| {
            build
                .result
                .as_deref()
                .is_some_and(|result| results.contains(&result))
        }))
    }

    fn build_datetime(&self, job: &Job, build: &str) -> Option<NaiveDateTime> {
        let url = quote(&format!("{}/{build}/api/json", job.url.trim_end_matches('/')));
        match read_json::<Timestamped>(self.opener.as_ref(), &url) {
            Ok(build) => from_timestamp_millis(build.timestamp),
            Err(err) => {
                warn!(%url, reason = %err, "Couldn't get build timestamp");
                None
            }
        }
    }

    /// Age of the last build of a kind; `None` when there is no such build.
    fn build_age(
        &self,
        job: &Job,
        build: &str,
        results: &[&str],
        now: NaiveDateTime,
    ) -> Result<Option<TimeDelta>> {
        if !self.has_builds_with(job, results)? {
            return Ok(None);
        }
        Ok(self.build_datetime(job, build).map(|moment| now - moment))
    }

    fn last_stable_build_age(&self, job: &Job, now: NaiveDateTime) -> Result<Option<TimeDelta>> {
        self.build_age(job, "lastStableBuild", &["SUCCESS"], now)
    }

    fn job_info(&self, job: &Job, now: NaiveDateTime) -> Result<JobInfo> {
        Ok(JobInfo {
            name: display_name(job),
            url: job.url.clone(),
            days: self
                .last_stable_build_age(job, now)?
                .map(|age| age.num_days()),
        })
    }
}

impl MetricSource for Jenkins {
    fn kind(&self) -> SourceKind {
        SourceKind::Jenkins
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn metric_source_urls(&self, _ids: &[&str]) -> Vec<String> {
        vec![self.url.clone()]
    }
}

impl CiServer for Jenkins {
    fn number_of_active_jobs(&self, ids: &[&str]) -> Result<usize> {
        Ok(self.active_jobs(ids)?.len())
    }

    fn failing_jobs(&self, ids: &[&str], now: NaiveDateTime) -> Result<Vec<JobInfo>> {
        let mut failing = Vec::new();
        for job in self.active_jobs(ids)? {
            if self.finished_builds(job)?.is_empty() {
                continue;
            }
            if job.color.as_deref().is_some_and(|color| color.starts_with("blue")) {
                continue;
            }
            let old = self
                .last_stable_build_age(job, now)?
                .is_none_or(|age| age > TimeDelta::days(1));
            if old {
                failing.push(self.job_info(job, now)?);
            }
        }
        Ok(failing)
    }

    fn unused_jobs(&self, ids: &[&str], now: NaiveDateTime) -> Result<Vec<JobInfo>> {
        let mut unused = Vec::new();
        for job in self.active_jobs(ids)? {
            let age = self.build_age(job, "lastCompletedBuild", &["SUCCESS", "FAILURE", "UNSTABLE"], now)?;
            if age.is_none_or(|age| age > TimeDelta::days(grace_days(job))) {
                unused.push(self.job_info(job, now)?);
            }
        }
        Ok(unused)
    }
}

/// Grace period from a `[gracedays=N]` marker in the job description.
pub fn grace_days(job: &Job) -> i64 {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let description = job.description.as_deref().unwrap_or_default().to_lowercase();
    PATTERN
        .get_or_init(|| Regex::new(r"\[gracedays=(\d+)\]").ok())
        .as_ref()
        .and_then(|pattern| pattern.captures(&description))
        .and_then(|captures| captures.get(1))
        .and_then(|days| days.as_str().parse().ok())
        .unwrap_or(DEFAULT_GRACE_DAYS)
}

/// "folder/job" for jobs nested in a folder, the plain name otherwise.
fn display_name(job: &Job) -> String {
    let parts: Vec<&str> = job.url.trim_end_matches('/').split('/').collect();
    let length = parts.len();
    if length > 3
        && parts[length - 1] == job.name
        && parts[length - 2] == "job"
        && parts[length - 4] == "job"
    {
        format!("{}/{}", parts[length - 3], parts[length - 1])
    } else {
        job.name.clone()
    }
}

fn with_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

/// Jenkins may return urls with unquoted spaces.
fn quote(url: &str) -> String {
    url.replace(' ', "%20")
}
