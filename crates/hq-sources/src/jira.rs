//! Jira issue tracker, queried through saved filters or JQL.
//!
//! An id that consists of digits only names a saved filter and is resolved
//! through `rest/api/2/filter/{id}`. Any other id is used as a JQL query.

use std::sync::{Arc, OnceLock};

use chrono::NaiveDateTime;
use hq_model::SourceKind;
use hq_model::format::url_join;
use hq_model::parse::parse_iso_datetime;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info};

use crate::error::{Result, SourceError};
use crate::opener::{UrlRead, read_json};
use crate::source::MetricSource;

const IN_PROGRESS: &str = "In Progress";

/// A link to an issue with its summary as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueLink {
    pub href: String,
    pub text: String,
}

/// Number of issues over one or more queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueCount {
    pub count: i64,
    pub issues: Vec<IssueLink>,
}

/// When a story first entered and last left "In Progress".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryProgress {
    pub issue: IssueLink,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize)]
struct Filter {
    #[serde(rename = "searchUrl")]
    search_url: String,
    #[serde(rename = "viewUrl")]
    view_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchIssue {
    key: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    total: i64,
    #[serde(default)]
    issues: Vec<SearchIssue>,
}

#[derive(Debug, Deserialize)]
struct Field {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ChangeItem {
    field: String,
    #[serde(default)]
    fieldtype: String,
    #[serde(rename = "fromString")]
    from_status: Option<String>,
    #[serde(rename = "toString")]
    to_status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct History {
    created: String,
    #[serde(default)]
    items: Vec<ChangeItem>,
}

#[derive(Debug, Deserialize)]
struct Changelog {
    #[serde(default)]
    histories: Vec<History>,
}

#[derive(Debug, Deserialize)]
struct IssueDetails {
    changelog: Changelog,
}

pub struct Jira {
    url: String,
    opener: Arc<dyn UrlRead>,
    field_name: Option<String>,
    field_id: OnceLock<Option<String>>,
}

impl Jira {
    /// `field_name` is the issue field summed by story point metrics.
    pub fn new(url: &str, field_name: Option<String>, opener: Arc<dyn UrlRead>) -> Self {
        let url = if url.ends_with('/') {
            url.to_string()
        } else {
            format!("{url}/")
        };
        Self {
            url,
            opener,
            field_name,
            field_id: OnceLock::new(),
        }
    }

    /// Search (api) or view (browser) url of a query id.
    pub fn query_url(&self, query_id: &str, search: bool) -> Result<String> {
        if query_id.is_empty() {
            return Err(SourceError::NoIds);
        }
        if query_id.chars().all(|ch| ch.is_ascii_digit()) {
            let filter: Filter = read_json(
                self.opener.as_ref(),
                &format!("{}rest/api/2/filter/{query_id}", self.url),
            )?;
            return Ok(if search {
                filter.search_url
            } else {
                filter.view_url
            });
        }
        let jql = urlencoding::encode(query_id);
        Ok(if search {
            format!("{}rest/api/2/search?maxResults=1000&jql={jql}", self.url)
        } else {
            format!("{}issues/?jql={jql}", self.url)
        })
    }

    /// Runs a query against the configured host, whatever host Jira
    /// reports in its filter urls.
    fn query(&self, query_id: &str) -> Result<SearchResult> {
        let query_url = self.query_url(query_id, true)?;
        let base = Url::parse(&self.url).map_err(|err| SourceError::InvalidUrl(err.to_string()))?;
        let query = Url::parse(&query_url).map_err(|err| SourceError::InvalidUrl(err.to_string()))?;
        let mut read_url = format!(
            "{}://{}{}",
            base.scheme(),
            base.host_str().unwrap_or_default(),
            base.port().map(|port| format!(":{port}")).unwrap_or_default()
        );
        read_url.push_str(query.path());
        read_url.push_str("?maxResults=1000");
        for parameter in query
            .query()
            .unwrap_or_default()
            .split('&')
            .filter(|parameter| !parameter.is_empty() && !parameter.starts_with("maxResults="))
        {
            read_url.push('&');
            read_url.push_str(parameter);
        }
        read_json(self.opener.as_ref(), &read_url)
    }

    pub fn issue_url(&self, key: &str) -> String {
        url_join(&[&self.url, "browse", key])
    }

    fn link(&self, issue: &SearchIssue) -> IssueLink {
        let summary = issue
            .fields
            .get("summary")
            .and_then(Value::as_str)
            .unwrap_or_default();
        IssueLink {
            href: self.issue_url(&issue.key),
            text: summary.to_string(),
        }
    }

    /// Id of the configured field, looked up by name.
    fn field_id(&self) -> Result<&str> {
        let field_id = self.field_id.get_or_init(|| {
            let name = self.field_name.as_deref()?;
            let fields: Vec<Field> =
                read_json(self.opener.as_ref(), &format!("{}rest/api/2/field", self.url)).ok()?;
            let id = fields.into_iter().find(|field| field.name == name).map(|field| field.id);
            if id.is_none() {
                error!(field = %name, "Error retrieving id for the field");
            }
            id
        });
        field_id
            .as_deref()
            .ok_or_else(|| SourceError::Parse("no usable field name configured".to_string()))
    }

    /// Number of issues over all queries.
    pub fn nr_issues(&self, ids: &[&str]) -> Result<IssueCount> {
        if ids.is_empty() {
            return Err(SourceError::NoIds);
        }
        let mut total = IssueCount::default();
        for id in ids {
            let result = self.query(id)?;
            total.count += result.total;
            total
                .issues
                .extend(result.issues.iter().map(|issue| self.link(issue)));
        }
        Ok(total)
    }

    /// Issues whose configured field holds no number.
    pub fn nr_issues_with_field_empty(&self, ids: &[&str]) -> Result<IssueCount> {
        if ids.is_empty() {
            return Err(SourceError::NoIds);
        }
        let field = self.field_id()?;
        let mut total = IssueCount::default();
        for id in ids {
            for issue in self.query(id)?.issues {
                if numeric(issue.fields.get(field)).is_none() {
                    total.count += 1;
                    total.issues.push(self.link(&issue));
                }
            }
        }
        Ok(total)
    }

    /// Issues with a value in the configured field, with that value.
    pub fn issues_with_field(&self, ids: &[&str]) -> Result<Vec<(IssueLink, f64)>> {
        if ids.is_empty() {
            return Err(SourceError::NoIds);
        }
        let field = self.field_id()?;
        let mut found = Vec::new();
        for id in ids {
            for issue in self.query(id)?.issues {
                if let Some(value) = numeric(issue.fields.get(field)) {
                    found.push((self.link(&issue), value));
                }
            }
        }
        Ok(found)
    }

    /// Progress dates of every issue returned by the queries.
    pub fn story_progress(&self, ids: &[&str]) -> Result<Vec<StoryProgress>> {
        if ids.is_empty() {
            return Err(SourceError::NoIds);
        }
        let mut stories = Vec::new();
        for id in ids {
            for issue in self.query(id)?.issues {
                let (start, end) = self.progress_dates(&issue.key)?;
                stories.push(StoryProgress {
                    issue: self.link(&issue),
                    start,
                    end,
                });
            }
        }
        Ok(stories)
    }

    fn progress_dates(&self, key: &str) -> Result<(Option<NaiveDateTime>, Option<NaiveDateTime>)> {
        let url = format!(
            "{}rest/api/2/issue/{key}?maxResults=1000&expand=changelog&fields=\"*all,-comment\"",
            self.url
        );
        let details: IssueDetails = read_json(self.opener.as_ref(), &url)?;
        Ok(progress_dates(&details.changelog, key))
    }
}

fn numeric(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// First move into and last move out of "In Progress".
fn progress_dates(changelog: &Changelog, key: &str) -> (Option<NaiveDateTime>, Option<NaiveDateTime>) {
    let moments = |into: bool| {
        changelog
            .histories
            .iter()
            .filter(move |history| {
                history.items.iter().any(|item| {
                    let status = if into {
                        &item.to_status
                    } else {
                        &item.from_status
                    };
                    item.field == "status"
                        && item.fieldtype == "jira"
                        && status.as_deref() == Some(IN_PROGRESS)
                })
            })
            .filter_map(|history| parse_iso_datetime(&history.created))
    };
    let start = moments(true).min();
    if start.is_none() {
        info!(issue = %key, "Issue never moved to status 'In Progress'");
        return (None, None);
    }
    let end = moments(false).max();
    if end.is_none() {
        info!(issue = %key, "Issue still in status 'In Progress'");
    }
    (start, end)
}

impl MetricSource for Jira {
    fn kind(&self) -> SourceKind {
        SourceKind::Jira
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn metric_source_urls(&self, ids: &[&str]) -> Vec<String> {
        ids.iter()
            .filter_map(|id| self.query_url(id, false).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_uses_first_start_and_last_end() {
        let changelog: Changelog = serde_json::from_value(serde_json::json!({
            "histories": [
                {"created": "2024-01-02T10:00:00.000+0100", "items": [
                    {"field": "status", "fieldtype": "jira", "fromString": "Open", "toString": "In Progress"}]},
                {"created": "2024-01-04T10:00:00.000+0100", "items": [
                    {"field": "status", "fieldtype": "jira", "fromString": "In Progress", "toString": "Review"}]},
                {"created": "2024-01-05T10:00:00.000+0100", "items": [
                    {"field": "status", "fieldtype": "jira", "fromString": "Review", "toString": "In Progress"}]},
                {"created": "2024-01-08T09:00:00.000+0100", "items": [
                    {"field": "status", "fieldtype": "jira", "fromString": "In Progress", "toString": "Done"}]}
            ]
        }))
        .expect("changelog");
        let (start, end) = progress_dates(&changelog, "X-1");
        assert_eq!(start.map(|start| start.to_string()).as_deref(), Some("2024-01-02 10:00:00"));
        assert_eq!(end.map(|end| end.to_string()).as_deref(), Some("2024-01-08 09:00:00"));
    }

    #[test]
    fn story_never_started_has_no_dates() {
        let changelog = Changelog { histories: vec![] };
        assert_eq!(progress_dates(&changelog, "X-2"), (None, None));
    }

    #[test]
    fn numbers_may_be_strings() {
        assert_eq!(numeric(Some(&serde_json::json!(3.5))), Some(3.5));
        assert_eq!(numeric(Some(&serde_json::json!("8"))), Some(8.0));
        assert_eq!(numeric(Some(&Value::Null)), None);
        assert_eq!(numeric(None), None);
    }
}
