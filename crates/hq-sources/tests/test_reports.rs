//! Integration tests for the test report adapters.

use std::sync::Arc;

use hq_model::parse::from_timestamp_millis;
use hq_sources::fake::FakeOpener;
use hq_sources::jenkins_test_report::JenkinsTestReport;
use hq_sources::junit::JunitTestReport;
use hq_sources::{MetricSource, SourceError, TestCounts, TestReport};

const JUNIT_URL: &str = "http://ci/reports/junit/junit.xml";

const JUNIT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuites>
  <testsuite name="unit" tests="10" errors="1" skipped="2" timestamp="2024-05-02T08:15:00">
    <testcase name="a"><failure message="expected 1"/></testcase>
    <testcase name="b"/>
  </testsuite>
  <testsuite name="api" tests="4" timestamp="2024-05-01T22:00:00">
    <testcase name="c"><failure/></testcase>
  </testsuite>
</testsuites>"#;

#[test]
fn junit_report_counts_and_date() {
    let opener = FakeOpener::new().with(JUNIT_URL, JUNIT);
    let report = JunitTestReport::new("http://ci/", Arc::new(opener));

    let counts = report.total_test_counts(&[JUNIT_URL]).expect("counts");
    assert_eq!(
        counts,
        TestCounts {
            passed: 9,
            failed: 3,
            skipped: 2
        }
    );
    assert_eq!(
        report.oldest_report_datetime(&[JUNIT_URL]).expect("date").to_string(),
        "2024-05-01 22:00:00"
    );
    assert_eq!(
        report.metric_source_urls(&[JUNIT_URL]),
        vec!["http://ci/reports/html/htmlReport.html".to_string()]
    );
}

#[test]
fn junit_report_needs_ids_and_valid_xml() {
    let opener = FakeOpener::new().with(JUNIT_URL, "<testsuites><testsuite");
    let report = JunitTestReport::new("http://ci/", Arc::new(opener));
    assert!(matches!(report.total_test_counts(&[]), Err(SourceError::NoIds)));
    assert!(report.total_test_counts(&[JUNIT_URL]).is_err());
}

const JENKINS: &str = "http://jenkins/";

fn jenkins() -> FakeOpener {
    FakeOpener::new()
        .with(
            format!("{JENKINS}api/json?tree=jobs[name,description,color,url,buildable]"),
            r#"{"jobs": [
                {"name": "it-backend", "url": "http://jenkins/job/it-backend/", "buildable": true},
                {"name": "it-frontend", "url": "http://jenkins/job/it-frontend/", "buildable": true},
                {"name": "release", "url": "http://jenkins/job/release/", "buildable": true}
            ]}"#,
        )
        .with(
            format!("{JENKINS}job/it-backend/lastCompletedBuild/testReport/api/json"),
            r#"{"passCount": 20, "failCount": 2, "skipCount": 1}"#,
        )
        .with(
            format!("{JENKINS}job/it-frontend/lastSuccessfulBuild/testReport/api/json"),
            r#"{"totalCount": 12, "failCount": 0, "skipCount": 2}"#,
        )
        .with(
            format!("{JENKINS}job/it-backend/lastCompletedBuild/api/json"),
            r#"{"timestamp": 1714550400000}"#,
        )
        .with(
            format!("{JENKINS}job/it-frontend/lastCompletedBuild/api/json"),
            r#"{"timestamp": 1714464000000}"#,
        )
}

#[test]
fn jenkins_patterns_expand_to_jobs() {
    let report = JenkinsTestReport::new(JENKINS, Arc::new(jenkins()));
    assert_eq!(report.expand_ids(&["it-.*"]), vec!["it-backend", "it-frontend"]);
    assert_eq!(report.expand_ids(&["release"]), vec!["release"]);
    assert_eq!(report.expand_ids(&["missing"]), vec!["missing"]);
}

#[test]
fn jenkins_counts_fall_back_to_successful_build() {
    let report = JenkinsTestReport::new(JENKINS, Arc::new(jenkins()));
    let counts = report.total_test_counts(&["it-.*"]).expect("counts");
    assert_eq!(counts.passed, 30);
    assert_eq!(counts.failed, 2);
    assert_eq!(counts.skipped, 3);
    assert_eq!(counts.total(), 35);
}

#[test]
fn jenkins_oldest_build_and_urls() {
    let report = JenkinsTestReport::new(JENKINS, Arc::new(jenkins()));
    assert_eq!(
        report.oldest_report_datetime(&["it-.*"]).expect("date"),
        from_timestamp_millis(1_714_464_000_000).expect("timestamp")
    );
    assert_eq!(
        report.metric_source_urls(&["it-.*"]),
        vec![
            "http://jenkins/job/it-backend".to_string(),
            "http://jenkins/job/it-frontend".to_string()
        ]
    );
}
