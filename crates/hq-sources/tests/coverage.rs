//! Integration tests for the coverage report and version control adapters.

use std::sync::Arc;

use hq_model::parse::from_timestamp_secs;
use hq_sources::fake::{FakeCommands, FakeOpener};
use hq_sources::git::{BranchFilter, Git};
use hq_sources::jacoco::JacocoReport;
use hq_sources::lcov::LcovReport;
use hq_sources::robot_framework::RobotFrameworkReport;
use hq_sources::testng::TestNgReport;
use hq_sources::{CoverageReport, MetricSource, TestCounts, TestReport};

const JACOCO_URL: &str = "http://ci/jacoco/index.html";

const JACOCO: &str = r#"<html><body><table class="coverage">
<thead><tr><td>Element</td><td>Missed Instructions</td><td>Cov.</td>
<td>Missed Branches</td><td>Cov.</td></tr></thead>
<tfoot><tr><td>Total</td><td class="bar">1.250 of 5.000</td><td class="ctr2">75%</td>
<td class="bar">30 of 120</td><td class="ctr2">75%</td></tr></tfoot>
<tbody><tr><td><a href="nl.ictu/index.html">nl.ictu</a></td><td>1.250 of 5.000</td></tr></tbody>
</table></body></html>"#;

const JACOCO_SESSIONS: &str = r#"<html><body><table class="coverage">
<thead><tr><td>Session</td><td>Start Time</td><td>Dump Time</td></tr></thead>
<tbody>
<tr><td>it-run-1</td><td>May 1, 2024 10:00:00 PM</td><td>May 1, 2024 10:30:00 PM</td></tr>
<tr><td>it-run-2</td><td>2 mei 2024 07:45:00</td><td>2 mei 2024 08:15:00</td></tr>
</tbody></table></body></html>"#;

#[test]
fn jacoco_report_coverage_and_session_date() {
    let opener = Arc::new(
        FakeOpener::new()
            .with(JACOCO_URL, JACOCO)
            .with("http://ci/jacoco/.sessions.html", JACOCO_SESSIONS),
    );
    let report = JacocoReport::new("http://ci/", opener.clone());

    assert_eq!(report.statement_coverage(JACOCO_URL).expect("statements"), 75.0);
    assert_eq!(report.branch_coverage(JACOCO_URL).expect("branches"), 75.0);
    assert_eq!(
        report.coverage_datetime(JACOCO_URL).expect("date").to_string(),
        "2024-05-02 08:15:00"
    );
    assert!(
        opener
            .requests()
            .contains(&"http://ci/jacoco/jacoco-sessions.html".to_string())
    );
}

#[test]
fn jacoco_report_without_sessions_has_no_date() {
    let opener = FakeOpener::new().with(JACOCO_URL, JACOCO);
    let report = JacocoReport::new("http://ci/", Arc::new(opener));
    assert!(report.coverage_datetime(JACOCO_URL).is_err());
    assert!(report.statement_coverage("http://ci/other/index.html").is_err());
}

const LCOV_URL: &str = "http://ci/lcov/index.html";

const LCOV: &str = r#"<html><body><table width="100%" border=0 cellspacing=0 cellpadding=0>
<tr><td class="headerItem">Test:</td><td class="headerValue">coverage.info</td>
<td></td><td class="headerItem">Hit</td><td class="headerItem">Total</td>
<td class="headerItem">Coverage</td></tr>
<tr><td class="headerItem">Date:</td><td class="headerValue">2024-05-02 08:15:00</td>
<td class="headerItem">Lines:</td><td class="headerCovTableEntry">450</td>
<td class="headerCovTableEntry">600</td><td class="headerCovTableEntryMed">75.0 %</td></tr>
<tr><td></td><td></td><td class="headerItem">Branches:</td>
<td class="headerCovTableEntry">40</td><td class="headerCovTableEntry">80</td>
<td class="headerCovTableEntryLo">50.0 %</td></tr>
</table></body></html>"#;

#[test]
fn lcov_report_coverage_and_date() {
    let report = LcovReport::new("http://ci/", Arc::new(FakeOpener::new().with(LCOV_URL, LCOV)));
    assert_eq!(report.statement_coverage(LCOV_URL).expect("lines"), 75.0);
    assert_eq!(report.branch_coverage(LCOV_URL).expect("branches"), 50.0);
    assert_eq!(
        report.coverage_datetime(LCOV_URL).expect("date").to_string(),
        "2024-05-02 08:15:00"
    );
}

const ROBOT_URL: &str = "http://ci/robot/output.xml";

const ROBOT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<robot generator="Robot 6.1 (Python 3.11 on linux)" generated="20240502 08:15:00.250">
  <suite name="Portaal"/>
  <statistics>
    <total>
      <stat pass="12" fail="1" skip="2">All Tests</stat>
    </total>
  </statistics>
</robot>"#;

#[test]
fn robot_framework_report_counts_and_links_to_the_html_report() {
    let report =
        RobotFrameworkReport::new("http://ci/", Arc::new(FakeOpener::new().with(ROBOT_URL, ROBOT)));
    assert_eq!(
        report.total_test_counts(&[ROBOT_URL]).expect("counts"),
        TestCounts {
            passed: 12,
            failed: 1,
            skipped: 2
        }
    );
    assert_eq!(
        report.oldest_report_datetime(&[ROBOT_URL]).expect("date").to_string(),
        "2024-05-02 08:15:00.250"
    );
    assert_eq!(
        report.metric_source_urls(&[ROBOT_URL]),
        vec!["http://ci/robot/report.html".to_string()]
    );
}

const TESTNG_URL: &str = "http://ci/testng/testng-results.xml";

const TESTNG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testng-results ignored="0" total="9" passed="6" failed="2" skipped="1">
  <suite name="api" started-at="2024-05-02T08:15:00Z" finished-at="2024-05-02T08:20:00Z"/>
</testng-results>"#;

#[test]
fn testng_reports_add_up() {
    let other = "http://ci/testng/other/testng-results.xml";
    let opener = FakeOpener::new().with(TESTNG_URL, TESTNG).with(
        other,
        r#"<testng-results passed="1" failed="0" skipped="0">
          <suite name="ui" started-at="2024-05-01T21:00:00Z"/>
        </testng-results>"#,
    );
    let report = TestNgReport::new("http://ci/", Arc::new(opener));
    assert_eq!(
        report.total_test_counts(&[TESTNG_URL, other]).expect("counts"),
        TestCounts {
            passed: 7,
            failed: 2,
            skipped: 1
        }
    );
    assert_eq!(
        report.oldest_report_datetime(&[TESTNG_URL, other]).expect("date").to_string(),
        "2024-05-01 21:00:00"
    );
}

const REPO_URL: &str = "https://git.example.org/portaal";

fn commands() -> FakeCommands {
    FakeCommands::new()
        .with("clone", "")
        .with(
            "branch --list --remote --no-color",
            "  origin/HEAD -> origin/master\n  origin/master\n  origin/feature\n  origin/old\n",
        )
        .with(
            "branch --list --remote --no-color --no-merged",
            "  origin/feature\n  origin/old\n",
        )
        .with("cherry origin/master origin/feature", "+ 1a2b3c\n+ 4d5e6f\n")
        .with("cherry origin/master origin/old", "+ 0f0f0f\n")
        .with("log --format=%ct -n 1 origin/feature", "1714630500\n")
}

#[test]
fn git_lists_unmerged_branches_from_a_single_clone() {
    let checkout_dir = tempfile::tempdir().expect("temp dir");
    let commands = Arc::new(commands());
    let git = Git::new(REPO_URL, None, checkout_dir.path().to_path_buf(), commands.clone());
    assert_eq!(git.kind().to_string(), "Git");

    let filter = BranchFilter::new(vec!["origin/old".to_string()], None, Vec::new())
        .expect("filter");
    let branches = git.unmerged_branches(&filter).expect("branches");
    assert_eq!(branches.len(), 1);
    assert_eq!(branches[0].name, "origin/feature");
    assert_eq!(branches[0].unmerged_commits, 2);
    assert_eq!(branches[0].last_change, from_timestamp_secs(1_714_630_500));
    assert_eq!(
        git.branches(false).expect("all branches"),
        vec!["origin/feature", "origin/old"]
    );

    let calls = commands.calls();
    assert_eq!(calls.iter().filter(|call| call.starts_with("clone")).count(), 1);
    assert!(calls[0].starts_with(&format!("clone {REPO_URL} ")));
    assert!(!calls.iter().any(|call| call.starts_with("cherry origin/master origin/old")));
}

#[test]
fn git_branch_checkout_compares_with_that_branch() {
    let checkout_dir = tempfile::tempdir().expect("temp dir");
    let commands = Arc::new(
        FakeCommands::new()
            .with("clone", "")
            .with("branch --list --remote --no-color --no-merged", "  origin/feature\n")
            .with("cherry develop origin/feature", "+ 1a2b3c\n"),
    );
    let git = Git::new(
        REPO_URL,
        Some("develop".to_string()),
        checkout_dir.path().to_path_buf(),
        commands.clone(),
    );
    let branches = git.unmerged_branches(&BranchFilter::default()).expect("branches");
    assert_eq!(branches[0].unmerged_commits, 1);
    assert_eq!(branches[0].last_change, None);
    assert!(commands.calls()[0].starts_with(&format!("clone --branch develop {REPO_URL} ")));
}

#[test]
fn failed_clone_is_reported_without_retrying() {
    let checkout_dir = tempfile::tempdir().expect("temp dir");
    let commands = Arc::new(FakeCommands::new());
    let git = Git::new(REPO_URL, None, checkout_dir.path().to_path_buf(), commands.clone());
    assert!(git.branches(true).is_err());
    assert!(git.unmerged_branches(&BranchFilter::default()).is_err());
    assert_eq!(commands.calls().len(), 1);
}
