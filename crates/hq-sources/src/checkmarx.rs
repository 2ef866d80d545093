//! Checkmarx static analysis, addressed by project name.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDateTime;
use hq_model::SourceKind;
use hq_model::format::url_join;
use hq_model::parse::parse_iso_datetime;
use serde::Deserialize;
use tracing::{error, info};

use crate::error::{Result, SourceError};
use crate::opener::{UrlOpener, UrlRead, read_json};
use crate::source::MetricSource;

const CLIENT_SECRET: &str = "014DF517-39D1-4453-B7B3-9930C563627C";

#[derive(Debug, Deserialize)]
struct Token {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Project {
    id: i64,
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScanDates {
    finished_on: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Scan {
    id: i64,
    date_and_time: Option<ScanDates>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    high_severity: i64,
    medium_severity: i64,
}

/// Warning severity counted by the Checkmarx metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    High,
    Medium,
}

/// Gets an access token with the password grant of the Checkmarx REST API.
pub fn fetch_token(opener: &UrlOpener, url: &str, username: &str, password: &str) -> Result<String> {
    let token_url = url_join(&[url, "cxrestapi/auth/identity/connect/token"]);
    let body = format!(
        "username={}&password={}&scope=sast_rest_api&grant_type=password\
         &client_id=resource_owner_client&client_secret={CLIENT_SECRET}",
        urlencoding::encode(username),
        urlencoding::encode(password)
    );
    let response = opener.post_form(&token_url, body).inspect_err(|_| {
        error!(url = %token_url, "HTTP error during the retrieving of access token");
    })?;
    parse_token(&response)
}

fn parse_token(response: &str) -> Result<String> {
    let token: Token = serde_json::from_str(response).map_err(|err| {
        error!(reason = %err, "Couldn't load access token from json");
        SourceError::Json(err.to_string())
    })?;
    Ok(token.access_token)
}

pub struct Checkmarx {
    url: String,
    opener: Arc<dyn UrlRead>,
    project_ids: Mutex<HashMap<String, i64>>,
}

impl Checkmarx {
    /// `opener` must already carry the bearer token, see [`fetch_token`].
    pub fn new(url: &str, opener: Arc<dyn UrlRead>) -> Self {
        Self {
            url: url.to_string(),
            opener,
            project_ids: Mutex::new(HashMap::new()),
        }
    }

    fn project_id(&self, project_name: &str) -> Result<i64> {
        if let Some(id) = self
            .project_ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(project_name)
        {
            return Ok(*id);
        }
        let projects: Vec<Project> =
            read_json(self.opener.as_ref(), &url_join(&[&self.url, "CxRestAPI/projects"]))?;
        let id = projects
            .into_iter()
            .find(|project| project.name == project_name)
            .map(|project| project.id)
            .ok_or_else(|| {
                error!(project = %project_name, "No project id found for project");
                SourceError::Parse(format!("no Checkmarx project named {project_name}"))
            })?;
        self.project_ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(project_name.to_string(), id);
        Ok(id)
    }

    fn last_scan(&self, project_id: i64) -> Result<Scan> {
        let url = url_join(&[
            &self.url,
            &format!("CxRestAPI/sast/scans?projectId={project_id}&last=1&scanStatus=7"),
        ]);
        let scans: Vec<Scan> = read_json(self.opener.as_ref(), &url)?;
        scans.into_iter().next().ok_or_else(|| {
            error!(project_id, "There are still no scans for project");
            SourceError::Parse(format!("no finished scans for project {project_id}"))
        })
    }

    /// Warnings of a severity in the last scans of the projects.
    pub fn nr_warnings(&self, ids: &[&str], severity: Severity) -> Result<i64> {
        if ids.is_empty() {
            return Err(SourceError::NoIds);
        }
        let mut total = 0;
        for project_name in ids {
            let scan = self.last_scan(self.project_id(project_name)?)?;
            let url = url_join(&[
                &self.url,
                &format!("CxRestAPI/sast/scans/{}/resultsStatistics", scan.id),
            ]);
            let statistics: Statistics = read_json(self.opener.as_ref(), &url)?;
            total += match severity {
                Severity::High => statistics.high_severity,
                Severity::Medium => statistics.medium_severity,
            };
        }
        Ok(total)
    }

    /// When the oldest of the last scans finished.
    pub fn datetime(&self, ids: &[&str]) -> Result<NaiveDateTime> {
        let mut oldest: Option<NaiveDateTime> = None;
        for project_name in ids {
            let project_id = self.project_id(project_name)?;
            let scan = self.last_scan(project_id)?;
            let finished = scan
                .date_and_time
                .and_then(|dates| dates.finished_on)
                .as_deref()
                .and_then(parse_iso_datetime)
                .ok_or_else(|| {
                    SourceError::Parse(format!("scan {} of {project_name} has no finish time", scan.id))
                })?;
            info!(project = %project_name, project_id, %finished, "Last scan date from Checkmarx");
            oldest = Some(oldest.map_or(finished, |current| current.min(finished)));
        }
        oldest.ok_or(SourceError::NoIds)
    }

    fn viewer_url(&self, project_name: &str) -> Result<String> {
        let project_id = self.project_id(project_name)?;
        let scan = self.last_scan(project_id)?;
        Ok(url_join(&[
            &self.url,
            &format!("CxWebClient/ViewerMain.aspx?scanId={}&ProjectID={project_id}", scan.id),
        ]))
    }
}

impl MetricSource for Checkmarx {
    fn kind(&self) -> SourceKind {
        SourceKind::Checkmarx
    }

    fn url(&self) -> &str {
        &self.url
    }

    /// Viewer urls of the last scans, or the server url when any lookup fails.
    fn metric_source_urls(&self, ids: &[&str]) -> Vec<String> {
        ids.iter()
            .map(|id| self.viewer_url(id))
            .collect::<Result<Vec<_>>>()
            .unwrap_or_else(|_| vec![self.url.clone()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_read_from_response() {
        assert_eq!(
            parse_token(r#"{"access_token": "abc", "expires_in": 3600}"#).expect("token"),
            "abc"
        );
        assert!(parse_token(r#"{"error": "invalid_grant"}"#).is_err());
    }
}
