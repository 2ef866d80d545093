//! OWASP dependency-check XML reports, addressed by report url.

use std::sync::Arc;

use chrono::NaiveDateTime;
use hq_model::SourceKind;
use hq_model::parse::parse_iso_datetime;
use serde::Serialize;
use tracing::error;

use crate::error::{Result, SourceError};
use crate::opener::UrlRead;
use crate::source::MetricSource;
use crate::xml::Element;

/// Vulnerability severity counted by the security metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Priority {
    High,
    Normal,
}

impl Priority {
    /// Severity text used in dependency-check reports.
    pub fn severity(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Normal => "Medium",
        }
    }
}

/// A vulnerable dependency with its CVEs of one priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VulnerableDependency {
    pub file_name: String,
    pub file_path: String,
    pub cves: Vec<(String, String)>,
}

pub struct OwaspDependencyReport {
    url: String,
    opener: Arc<dyn UrlRead>,
}

impl OwaspDependencyReport {
    pub fn new(url: &str, opener: Arc<dyn UrlRead>) -> Self {
        Self {
            url: url.to_string(),
            opener,
        }
    }

    fn root(&self, report_url: &str) -> Result<Element> {
        let contents = self.opener.url_read(report_url)?;
        Element::parse(&contents).inspect_err(|err| {
            error!(%report_url, reason = %err, "Error parsing returned xml");
        })
    }

    /// Distinct vulnerable dependency paths of a priority, summed over reports.
    pub fn nr_warnings(&self, ids: &[&str], priority: Priority) -> Result<usize> {
        if ids.is_empty() {
            return Err(SourceError::NoIds);
        }
        let mut total = 0;
        for id in ids {
            total += vulnerable_dependencies(&self.root(id)?, priority).len();
        }
        Ok(total)
    }

    /// Details of the vulnerable dependencies of a priority.
    pub fn dependencies(&self, ids: &[&str], priority: Priority) -> Result<Vec<VulnerableDependency>> {
        let mut found = Vec::new();
        for id in ids {
            found.extend(vulnerable_dependencies(&self.root(id)?, priority));
        }
        Ok(found)
    }

    /// Oldest report date.
    pub fn datetime(&self, ids: &[&str]) -> Result<NaiveDateTime> {
        let mut oldest: Option<NaiveDateTime> = None;
        for id in ids {
            let date = report_date(&self.root(id)?)?;
            oldest = Some(oldest.map_or(date, |current| current.min(date)));
        }
        oldest.ok_or(SourceError::NoIds)
    }
}

fn text_of(element: &Element, name: &str) -> String {
    element
        .child(name)
        .map(|child| child.text.clone())
        .unwrap_or_default()
}

/// Dependencies with at least one vulnerability of the priority, one entry per file path.
pub fn vulnerable_dependencies(root: &Element, priority: Priority) -> Vec<VulnerableDependency> {
    let mut found: Vec<VulnerableDependency> = Vec::new();
    for dependency in root.descendants("dependency") {
        let cves: Vec<(String, String)> = dependency
            .descendants("vulnerability")
            .into_iter()
            .filter(|vulnerability| text_of(vulnerability, "severity") == priority.severity())
            .map(|vulnerability| {
                let url = vulnerability
                    .child("references")
                    .and_then(|references| references.child("reference"))
                    .map(|reference| text_of(reference, "url"))
                    .unwrap_or_default();
                (text_of(vulnerability, "name"), url)
            })
            .collect();
        if cves.is_empty() {
            continue;
        }
        let file_path = text_of(dependency, "filePath");
        if found.iter().any(|known| known.file_path == file_path) {
            continue;
        }
        found.push(VulnerableDependency {
            file_name: text_of(dependency, "fileName"),
            file_path,
            cves,
        });
    }
    found
}

/// The `projectInfo/reportDate` of a report.
pub fn report_date(root: &Element) -> Result<NaiveDateTime> {
    root.descendants("projectInfo")
        .into_iter()
        .find_map(|info| info.child("reportDate"))
        .and_then(|date| parse_iso_datetime(&date.text))
        .ok_or_else(|| SourceError::Parse("report has no reportDate".to_string()))
}

impl MetricSource for OwaspDependencyReport {
    fn kind(&self) -> SourceKind {
        SourceKind::OwaspDependencyXml
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn metric_source_urls(&self, ids: &[&str]) -> Vec<String> {
        ids.iter()
            .map(|id| match id.strip_suffix("xml") {
                Some(base) => format!("{base}html"),
                None => (*id).to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"<?xml version="1.0"?>
    <analysis xmlns="https://jeremylong.github.io/DependencyCheck/dependency-check.1.3.xsd">
      <projectInfo><reportDate>2017-02-10T15:29:30.600+0000</reportDate></projectInfo>
      <dependencies>
        <dependency>
          <fileName>a.jar</fileName><filePath>lib/a.jar</filePath>
          <vulnerabilities>
            <vulnerability><name>CVE-1</name><severity>High</severity>
              <references><reference><url>http://cve/1</url></reference></references>
            </vulnerability>
            <vulnerability><name>CVE-2</name><severity>Medium</severity></vulnerability>
          </vulnerabilities>
        </dependency>
        <dependency>
          <fileName>b.jar</fileName><filePath>lib/b.jar</filePath>
          <vulnerabilities>
            <vulnerability><name>CVE-3</name><severity>Medium</severity></vulnerability>
          </vulnerabilities>
        </dependency>
        <dependency><fileName>c.jar</fileName><filePath>lib/c.jar</filePath></dependency>
      </dependencies>
    </analysis>"#;

    #[test]
    fn counts_dependencies_per_priority() {
        let root = Element::parse(REPORT).expect("xml");
        let high = vulnerable_dependencies(&root, Priority::High);
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].cves, vec![("CVE-1".to_string(), "http://cve/1".to_string())]);
        assert_eq!(vulnerable_dependencies(&root, Priority::Normal).len(), 2);
    }

    #[test]
    fn reads_report_date() {
        let root = Element::parse(REPORT).expect("xml");
        assert_eq!(report_date(&root).expect("date").to_string(), "2017-02-10 15:29:30");
    }
}
