//! Team mood as registered in the Happiness application.

use std::sync::Arc;

use chrono::NaiveDateTime;
use hq_model::SourceKind;
use hq_model::parse::parse_iso_date;
use serde::Deserialize;
use serde_json::Value;
use tracing::error;

use crate::error::{Result, SourceError};
use crate::opener::{UrlRead, read_json};
use crate::source::MetricSource;

#[derive(Debug, Deserialize)]
struct Measurement {
    smiley: Value,
    datum: String,
}

pub struct Happiness {
    url: String,
    opener: Arc<dyn UrlRead>,
}

impl Happiness {
    pub fn new(url: &str, opener: Arc<dyn UrlRead>) -> Self {
        let url = if url.ends_with('/') {
            url.to_string()
        } else {
            format!("{url}/")
        };
        Self { url, opener }
    }

    fn latest(&self, team_id: &str) -> Result<Measurement> {
        let url = format!("{}api/", self.url);
        let measurements: Vec<Measurement> = read_json(self.opener.as_ref(), &url)?;
        measurements.into_iter().last().ok_or_else(|| {
            error!(team = %team_id, %url, "Could not find smiley");
            SourceError::Parse(format!("no measurements for team {team_id}"))
        })
    }

    /// The latest smiley: ":-(", ":-|" or ":-)".
    pub fn team_spirit(&self, team_id: &str) -> Result<&'static str> {
        let latest = self.latest(team_id)?;
        let score = match &latest.smiley {
            Value::Number(number) => number.as_i64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        };
        smiley(score).ok_or_else(|| {
            SourceError::Parse(format!("unknown smiley {} for team {team_id}", latest.smiley))
        })
    }

    /// When the latest smiley was registered.
    pub fn datetime(&self, team_id: &str) -> Result<NaiveDateTime> {
        let latest = self.latest(team_id)?;
        parse_iso_date(&latest.datum)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .ok_or_else(|| SourceError::Parse(format!("invalid date {}", latest.datum)))
    }
}

fn smiley(score: Option<i64>) -> Option<&'static str> {
    match score? {
        1 | 2 => Some(":-("),
        3 => Some(":-|"),
        4 | 5 => Some(":-)"),
        _ => None,
    }
}

impl MetricSource for Happiness {
    fn kind(&self) -> SourceKind {
        SourceKind::Happiness
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn metric_source_urls(&self, _ids: &[&str]) -> Vec<String> {
        vec![self.url.clone()]
    }
}
