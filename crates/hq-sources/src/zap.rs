//! ZAP scan HTML reports, addressed by report url.
//!
//! The report has one table per alert. The header row carries the class
//! `risk-{level}` and the alert name; every instance starts with an
//! `indent1` cell followed by the instance url.

use std::sync::{Arc, OnceLock};

use hq_model::SourceKind;
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::{Result, SourceError};
use crate::opener::UrlRead;
use crate::source::MetricSource;

/// One instance of an alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZapAlert {
    pub name: String,
    pub url: String,
    /// Hex SHA-256 of "{name}|{url}".
    pub fingerprint: String,
    pub false_positive: bool,
}

pub struct ZapScanReport {
    url: String,
    opener: Arc<dyn UrlRead>,
    false_positives: Vec<String>,
}

impl ZapScanReport {
    /// `false_positives` holds fingerprints of instances to ignore.
    pub fn new(url: &str, false_positives: Vec<String>, opener: Arc<dyn UrlRead>) -> Self {
        Self {
            url: url.to_string(),
            opener,
            false_positives,
        }
    }

    /// All alert instances of a risk level, false positives included.
    pub fn warnings(&self, ids: &[&str], risk_level: &str) -> Result<Vec<ZapAlert>> {
        if ids.is_empty() {
            return Err(SourceError::NoIds);
        }
        let mut alerts = Vec::new();
        for id in ids {
            let html = self.opener.url_read(id)?;
            let found = parse_alerts(&html, risk_level)?;
            if found.is_empty() {
                warn!(report_url = %id, %risk_level, "Couldn't find any entries with risk level");
            }
            alerts.extend(found.into_iter().map(|(name, url)| {
                let fingerprint = fingerprint(&name, &url);
                let false_positive = self.false_positives.contains(&fingerprint);
                ZapAlert {
                    name,
                    url,
                    fingerprint,
                    false_positive,
                }
            }));
        }
        Ok(alerts)
    }

    /// Number of alert instances of a risk level, false positives excluded.
    pub fn alerts(&self, ids: &[&str], risk_level: &str) -> Result<usize> {
        Ok(self
            .warnings(ids, risk_level)?
            .iter()
            .filter(|alert| !alert.false_positive)
            .count())
    }
}

pub fn fingerprint(name: &str, url: &str) -> String {
    hex::encode(Sha256::digest(format!("{name}|{url}").as_bytes()))
}

fn patterns() -> Result<&'static (Regex, Regex, Regex)> {
    static PATTERNS: OnceLock<Option<(Regex, Regex, Regex)>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            let header = Regex::new(
                r#"(?s)<tr[^>]*class="risk-(\w+)"[^>]*>\s*<th[^>]*>.*?</th>\s*<th[^>]*>(.*?)</th>"#,
            )
            .ok()?;
            let instance =
                Regex::new(r#"(?s)<td[^>]*class="indent1"[^>]*>.*?</td>\s*<td[^>]*>(.*?)</td>"#).ok()?;
            let tag = Regex::new(r"<[^>]*>").ok()?;
            Some((header, instance, tag))
        })
        .as_ref()
        .ok_or_else(|| SourceError::Parse("invalid ZAP report patterns".to_string()))
}

fn cell_text(tag: &Regex, html: &str) -> String {
    tag.replace_all(html, "")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .trim()
        .to_string()
}

/// (alert name, instance url) pairs of a risk level.
pub fn parse_alerts(html: &str, risk_level: &str) -> Result<Vec<(String, String)>> {
    let (header, instance, tag) = patterns()?;
    let mut alerts = Vec::new();
    for table in html.split("</table>") {
        let Some(captures) = header.captures(table) else {
            continue;
        };
        if !captures[1].eq_ignore_ascii_case(risk_level) {
            continue;
        }
        let name = cell_text(tag, &captures[2]);
        for found in instance.captures_iter(table) {
            alerts.push((name.clone(), cell_text(tag, &found[1])));
        }
    }
    Ok(alerts)
}

impl MetricSource for ZapScanReport {
    fn kind(&self) -> SourceKind {
        SourceKind::ZapScanReport
    }

    fn url(&self) -> &str {
        &self.url
    }
}
