//! GitLab CI adapter, addressed by project path.

use std::sync::Arc;

use chrono::NaiveDateTime;
use hq_model::SourceKind;
use hq_model::parse::parse_iso_datetime;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, error};

use crate::error::{Result, SourceError};
use crate::jenkins::DEFAULT_GRACE_DAYS;
use crate::opener::{UrlRead, read_json};
use crate::source::{CiServer, JobInfo, MetricSource};

#[derive(Debug, Deserialize)]
struct Project {
    id: u64,
    name_with_namespace: String,
}

#[derive(Debug, Deserialize)]
struct PipelineSummary {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct Pipeline {
    finished_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Job {
    name: String,
    status: String,
    web_url: String,
}

pub struct GitLabCi {
    url: String,
    opener: Arc<dyn UrlRead>,
    job_re: Option<Regex>,
}

impl GitLabCi {
    /// The opener should authenticate with a private token.
    pub fn new(url: &str, job_re: Option<&str>, opener: Arc<dyn UrlRead>) -> Result<Self> {
        let url = if url.ends_with('/') {
            url.to_string()
        } else {
            format!("{url}/")
        };
        let job_re = job_re
            .filter(|pattern| !pattern.is_empty())
            .map(|pattern| Regex::new(&format!("^(?:{pattern})")))
            .transpose()?;
        Ok(Self {
            url,
            opener,
            job_re,
        })
    }

    fn api(&self, path: &str) -> String {
        format!("{}api/v4/{path}", self.url)
    }

    fn project(&self, path: &str) -> Result<Project> {
        read_json(
            self.opener.as_ref(),
            &self.api(&format!("projects/{}", urlencoding::encode(path))),
        )
        .inspect_err(|err| error!(project = %path, reason = %err, "Error retrieving project data"))
    }

    fn projects(&self, ids: &[&str]) -> Result<Vec<Project>> {
        if ids.is_empty() {
            return Err(SourceError::NoIds);
        }
        ids.iter().map(|path| self.project(path)).collect()
    }

    /// Finish time of the latest pipeline with one of the statuses.
    fn last_finished(&self, project: &Project, statuses: &[&str]) -> Result<Option<NaiveDateTime>> {
        let mut latest = None;
        for status in statuses {
            let url = self.api(&format!(
                "projects/{}/pipelines?status={status}&order_by=id&sort=desc&per_page=1",
                project.id
            ));
            let pipelines: Vec<PipelineSummary> = read_json(self.opener.as_ref(), &url)?;
            let Some(summary) = pipelines.first() else {
                continue;
            };
            let url = self.api(&format!("projects/{}/pipelines/{}", project.id, summary.id));
            let pipeline: Pipeline = read_json(self.opener.as_ref(), &url)?;
            let finished = pipeline.finished_at.as_deref().and_then(parse_iso_datetime);
            latest = latest.max(finished);
        }
        Ok(latest)
    }

    fn jobs(&self, project: &Project) -> Result<Vec<Job>> {
        let url = self.api(&format!("projects/{}/jobs?per_page=100", project.id));
        let jobs: Vec<Job> = read_json(self.opener.as_ref(), &url)?;
        Ok(jobs
            .into_iter()
            .filter(|job| self.job_re.as_ref().is_none_or(|regex| regex.is_match(&job.name)))
            .collect())
    }

    fn stale_jobs(
        &self,
        ids: &[&str],
        now: NaiveDateTime,
        statuses: &[&str],
        tolerated_days: i64,
        job_status: Option<&str>,
    ) -> Result<Vec<JobInfo>> {
        let mut stale = Vec::new();
        for project in self.projects(ids)? {
            let days = self
                .last_finished(&project, statuses)?
                .map(|finished| (now - finished).num_days());
            if days.is_some_and(|days| days <= tolerated_days) {
                continue;
            }
            debug!(project = %project.name_with_namespace, ?days, "Project has stale pipelines");
            for job in self.jobs(&project)? {
                if job_status.is_some_and(|status| job.status != status) {
                    continue;
                }
                stale.push(JobInfo {
                    name: format!("{} / {}", project.name_with_namespace, job.name),
                    url: job.web_url,
                    days,
                });
            }
        }
        Ok(stale)
    }
}

impl MetricSource for GitLabCi {
    fn kind(&self) -> SourceKind {
        SourceKind::GitlabCi
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn metric_source_urls(&self, ids: &[&str]) -> Vec<String> {
        ids.iter()
            .map(|path| format!("{}{}/pipelines", self.url, path.trim_matches('/')))
            .collect()
    }
}

impl CiServer for GitLabCi {
    fn number_of_active_jobs(&self, ids: &[&str]) -> Result<usize> {
        let mut count = 0;
        for project in self.projects(ids)? {
            count += self.jobs(&project)?.len();
        }
        Ok(count)
    }

    fn failing_jobs(&self, ids: &[&str], now: NaiveDateTime) -> Result<Vec<JobInfo>> {
        self.stale_jobs(ids, now, &["success"], 1, Some("failed"))
    }

    fn unused_jobs(&self, ids: &[&str], now: NaiveDateTime) -> Result<Vec<JobInfo>> {
        self.stale_jobs(ids, now, &["success", "failed"], DEFAULT_GRACE_DAYS, None)
    }
}
