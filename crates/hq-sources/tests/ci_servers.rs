//! Integration tests for the Jenkins and GitLab CI adapters.

use std::sync::Arc;

use chrono::{NaiveDate, TimeDelta};
use hq_model::parse::from_timestamp_millis;
use hq_sources::CiServer;
use hq_sources::fake::FakeOpener;
use hq_sources::gitlab::GitLabCi;
use hq_sources::jenkins::Jenkins;

const JENKINS: &str = "http://jenkins/";
const STABLE_BUILD: i64 = 1_700_000_000_000;
const DAY_MILLIS: i64 = 86_400_000;

fn jenkins_server() -> FakeOpener {
    FakeOpener::new()
        .with(
            format!("{JENKINS}api/json?tree=jobs[name,description,color,url,buildable]"),
            r#"{"jobs": [
                {"name": "build", "color": "red", "url": "http://jenkins/job/build/", "buildable": true},
                {"name": "deploy", "color": "blue", "url": "http://jenkins/job/deploy/", "buildable": true},
                {"name": "old", "color": "disabled", "url": "http://jenkins/job/old/", "buildable": false}
            ]}"#,
        )
        .with(
            format!("{JENKINS}job/build/api/json?tree=builds[result,building]&depth=1"),
            r#"{"builds": [{"result": "FAILURE", "building": false}, {"result": "SUCCESS", "building": false}]}"#,
        )
        .with(
            format!("{JENKINS}job/deploy/api/json?tree=builds[result,building]&depth=1"),
            r#"{"builds": [{"result": "SUCCESS", "building": false}]}"#,
        )
        .with(
            format!("{JENKINS}job/build/lastStableBuild/api/json"),
            format!(r#"{{"timestamp": {STABLE_BUILD}}}"#),
        )
        .with(
            format!("{JENKINS}job/build/lastCompletedBuild/api/json"),
            format!(r#"{{"timestamp": {}}}"#, STABLE_BUILD + DAY_MILLIS),
        )
}

#[test]
fn jenkins_counts_buildable_jobs() {
    let jenkins = Jenkins::new("http://jenkins", None, Arc::new(jenkins_server()));
    assert_eq!(jenkins.number_of_active_jobs(&[]).expect("jobs"), 2);
    assert_eq!(jenkins.number_of_active_jobs(&["dep.*"]).expect("jobs"), 1);
}

#[test]
fn jenkins_job_filter_applies_without_ids() {
    let jenkins = Jenkins::new(JENKINS, Some("build".to_string()), Arc::new(jenkins_server()));
    assert_eq!(jenkins.number_of_active_jobs(&[]).expect("jobs"), 1);
}

#[test]
fn jenkins_failing_jobs_have_old_stable_builds() {
    let jenkins = Jenkins::new(JENKINS, None, Arc::new(jenkins_server()));
    let now = from_timestamp_millis(STABLE_BUILD).expect("timestamp") + TimeDelta::days(3);

    let failing = jenkins.failing_jobs(&[], now).expect("failing jobs");
    assert_eq!(failing.len(), 1);
    assert_eq!(failing[0].name, "build");
    assert_eq!(failing[0].url, "http://jenkins/job/build/");
    assert_eq!(failing[0].days, Some(3));
}

#[test]
fn jenkins_unused_jobs_lack_recent_completed_builds() {
    let jenkins = Jenkins::new(JENKINS, None, Arc::new(jenkins_server()));
    let now = from_timestamp_millis(STABLE_BUILD).expect("timestamp") + TimeDelta::days(3);

    let unused = jenkins.unused_jobs(&[], now).expect("unused jobs");
    let names: Vec<&str> = unused.iter().map(|job| job.name.as_str()).collect();
    assert_eq!(names, vec!["deploy"]);
    assert_eq!(unused[0].days_label(), "?");
}

const GITLAB: &str = "http://gitlab/";

fn gitlab_server(failed_pipeline: &str) -> FakeOpener {
    FakeOpener::new()
        .with(
            format!("{GITLAB}api/v4/projects/group%2Fapp"),
            r#"{"id": 7, "name_with_namespace": "Group / App"}"#,
        )
        .with(
            format!("{GITLAB}api/v4/projects/7/pipelines?status=success&order_by=id&sort=desc&per_page=1"),
            r#"[{"id": 42, "status": "success"}]"#,
        )
        .with(
            format!("{GITLAB}api/v4/projects/7/pipelines?status=failed&order_by=id&sort=desc&per_page=1"),
            failed_pipeline.to_string(),
        )
        .with(
            format!("{GITLAB}api/v4/projects/7/pipelines/42"),
            r#"{"id": 42, "finished_at": "2024-03-01T10:00:00.000Z"}"#,
        )
        .with(
            format!("{GITLAB}api/v4/projects/7/jobs?per_page=100"),
            r#"[
                {"name": "test", "status": "failed", "web_url": "http://gitlab/group/app/-/jobs/1"},
                {"name": "lint", "status": "success", "web_url": "http://gitlab/group/app/-/jobs/2"}
            ]"#,
        )
}

fn march(day: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, day)
        .and_then(|date| date.and_hms_opt(10, 0, 0))
        .expect("valid date")
}

#[test]
fn gitlab_failing_jobs_of_projects_without_recent_success() {
    let gitlab = GitLabCi::new(GITLAB, None, Arc::new(gitlab_server("[]"))).expect("gitlab");

    let failing = gitlab.failing_jobs(&["group/app"], march(5)).expect("failing");
    assert_eq!(failing.len(), 1);
    assert_eq!(failing[0].name, "Group / App / test");
    assert_eq!(failing[0].days, Some(4));

    assert!(gitlab.failing_jobs(&["group/app"], march(1)).expect("failing").is_empty());
}

#[test]
fn gitlab_recent_pipelines_mean_no_unused_jobs() {
    let gitlab = GitLabCi::new(GITLAB, None, Arc::new(gitlab_server("[]"))).expect("gitlab");
    assert!(gitlab.unused_jobs(&["group/app"], march(5)).expect("unused").is_empty());
    assert_eq!(gitlab.number_of_active_jobs(&["group/app"]).expect("jobs"), 2);
}

#[test]
fn gitlab_job_filter_and_urls() {
    let gitlab = GitLabCi::new(GITLAB, Some("te"), Arc::new(gitlab_server("[]"))).expect("gitlab");
    assert_eq!(gitlab.number_of_active_jobs(&["group/app"]).expect("jobs"), 1);
    assert_eq!(
        hq_sources::MetricSource::metric_source_urls(&gitlab, &["group/app"]),
        vec!["http://gitlab/group/app/pipelines".to_string()]
    );
    assert!(GitLabCi::new(GITLAB, Some("("), Arc::new(FakeOpener::new())).is_err());
}
