//! Integration tests for the security report adapters.

use std::sync::Arc;

use hq_sources::{MetricSource, UrlRead};
use hq_sources::checkmarx::{Checkmarx, Severity};
use hq_sources::fake::FakeOpener;
use hq_sources::owasp::{OwaspDependencyReport, Priority};
use hq_sources::zap::{ZapScanReport, fingerprint};

const OWASP_URL: &str = "http://ci/owasp/dependency-check-report.xml";

const OWASP: &str = r#"<?xml version="1.0"?>
<analysis xmlns="https://jeremylong.github.io/DependencyCheck/dependency-check.2.0.xsd">
  <projectInfo><name>app</name><reportDate>2024-04-30T06:00:00.000+0000</reportDate></projectInfo>
  <dependencies>
    <dependency>
      <fileName>struts.jar</fileName><filePath>/lib/struts.jar</filePath>
      <vulnerabilities>
        <vulnerability><name>CVE-2017-5638</name><severity>High</severity>
          <references><reference><url>https://nvd.nist.gov/vuln/detail/CVE-2017-5638</url></reference></references>
        </vulnerability>
      </vulnerabilities>
    </dependency>
    <dependency>
      <fileName>struts.jar</fileName><filePath>/lib/struts.jar</filePath>
      <vulnerabilities>
        <vulnerability><name>CVE-2017-5638</name><severity>High</severity></vulnerability>
      </vulnerabilities>
    </dependency>
    <dependency>
      <fileName>commons.jar</fileName><filePath>/lib/commons.jar</filePath>
      <vulnerabilities>
        <vulnerability><name>CVE-2015-1</name><severity>Medium</severity></vulnerability>
      </vulnerabilities>
    </dependency>
  </dependencies>
</analysis>"#;

#[test]
fn owasp_counts_distinct_dependencies() {
    let opener = FakeOpener::new().with(OWASP_URL, OWASP);
    let report = OwaspDependencyReport::new("http://ci/", Arc::new(opener));

    assert_eq!(report.nr_warnings(&[OWASP_URL], Priority::High).expect("high"), 1);
    assert_eq!(report.nr_warnings(&[OWASP_URL], Priority::Normal).expect("normal"), 1);
    let dependencies = report.dependencies(&[OWASP_URL], Priority::High).expect("dependencies");
    insta::assert_json_snapshot!(dependencies, @r#"
    [
      {
        "file_name": "struts.jar",
        "file_path": "/lib/struts.jar",
        "cves": [
          [
            "CVE-2017-5638",
            "https://nvd.nist.gov/vuln/detail/CVE-2017-5638"
          ]
        ]
      }
    ]
    "#);
    assert_eq!(
        report.datetime(&[OWASP_URL]).expect("date").to_string(),
        "2024-04-30 06:00:00"
    );
    assert_eq!(
        report.metric_source_urls(&[OWASP_URL]),
        vec!["http://ci/owasp/dependency-check-report.html".to_string()]
    );
}

#[test]
fn owasp_unreadable_report_is_an_error() {
    let report = OwaspDependencyReport::new("http://ci/", Arc::new(FakeOpener::new()));
    assert!(report.nr_warnings(&[OWASP_URL], Priority::High).is_err());
    assert!(report.nr_warnings(&[], Priority::High).is_err());
}

const ZAP_URL: &str = "http://ci/zap/report.html";

const ZAP: &str = r##"<html><body><h1>ZAP Scanning Report</h1>
<table width="100%" class="results">
  <tr height="24" class="risk-medium"><th width="20%"><a name="medium"></a>Medium (Medium)</th>
  <th width="80%">X-Frame-Options Header Not Set</th></tr>
  <tr bgcolor="#e8e8e8"><td width="20%">Description</td><td width="80%"><p>Not set.</p></td></tr>
  <tr><td width="20%" class="indent1">URL</td><td width="80%">http://app/</td></tr>
  <tr><td width="20%" class="indent2">Method</td><td width="80%">GET</td></tr>
  <tr><td width="20%" class="indent1">URL</td><td width="80%">http://app/login</td></tr>
</table>
<table width="100%" class="results">
  <tr height="24" class="risk-low"><th width="20%">Low (Medium)</th>
  <th width="80%">Cookie No HttpOnly Flag</th></tr>
  <tr><td width="20%" class="indent1">URL</td><td width="80%">http://app/</td></tr>
</table>
</body></html>"##;

#[test]
fn zap_counts_alerts_without_false_positives() {
    let opener = Arc::new(FakeOpener::new().with(ZAP_URL, ZAP));
    let report = ZapScanReport::new("http://ci/", Vec::new(), Arc::clone(&opener) as Arc<dyn UrlRead>);
    assert_eq!(report.alerts(&[ZAP_URL], "medium").expect("alerts"), 2);
    assert_eq!(report.alerts(&[ZAP_URL], "high").expect("alerts"), 0);

    let ignored = fingerprint("X-Frame-Options Header Not Set", "http://app/login");
    let report = ZapScanReport::new("http://ci/", vec![ignored.clone()], opener);
    assert_eq!(report.alerts(&[ZAP_URL], "medium").expect("alerts"), 1);
    let warnings = report.warnings(&[ZAP_URL], "medium").expect("warnings");
    assert!(warnings.iter().any(|alert| alert.fingerprint == ignored && alert.false_positive));
}

const CX: &str = "http://cx/";

fn checkmarx() -> Checkmarx {
    let opener = FakeOpener::new()
        .with(
            format!("{CX}CxRestAPI/projects"),
            r#"[{"id": 3, "name": "portal"}, {"id": 4, "name": "backend"}]"#,
        )
        .with(
            format!("{CX}CxRestAPI/sast/scans?projectId=3&last=1&scanStatus=7"),
            r#"[{"id": 99, "dateAndTime": {"startedOn": "2024-05-01T01:00:00.5", "finishedOn": "2024-05-01T02:30:00.163"}}]"#,
        )
        .with(
            format!("{CX}CxRestAPI/sast/scans?projectId=4&last=1&scanStatus=7"),
            "[]",
        )
        .with(
            format!("{CX}CxRestAPI/sast/scans/99/resultsStatistics"),
            r#"{"highSeverity": 2, "mediumSeverity": 7, "lowSeverity": 12, "infoSeverity": 0}"#,
        );
    Checkmarx::new(CX, Arc::new(opener))
}

#[test]
fn checkmarx_reads_last_scan_statistics() {
    let checkmarx = checkmarx();
    assert_eq!(checkmarx.nr_warnings(&["portal"], Severity::High).expect("high"), 2);
    assert_eq!(checkmarx.nr_warnings(&["portal"], Severity::Medium).expect("medium"), 7);
    assert_eq!(
        checkmarx.datetime(&["portal"]).expect("date").to_string(),
        "2024-05-01 02:30:00"
    );
    assert_eq!(
        checkmarx.metric_source_urls(&["portal"]),
        vec!["http://cx/CxWebClient/ViewerMain.aspx?scanId=99&ProjectID=3".to_string()]
    );
}

#[test]
fn checkmarx_projects_without_scans() {
    let checkmarx = checkmarx();
    assert!(checkmarx.nr_warnings(&["backend"], Severity::High).is_err());
    assert!(checkmarx.nr_warnings(&["unknown"], Severity::High).is_err());
    assert_eq!(
        checkmarx.metric_source_urls(&["portal", "backend"]),
        vec!["http://cx/".to_string()]
    );
}
