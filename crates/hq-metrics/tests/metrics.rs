//! Integration tests for measuring metrics of a project against canned source responses.

use std::path::Path;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use hq_history::{CompactHistory, MetricRecord};
use hq_metrics::{Cell, Metric, MetricContext, MetricKind, meta_metrics, subject_metrics};
use hq_model::parse::from_timestamp_secs;
use hq_model::{MetricValue, Project, ProjectDefinition, Status};
use hq_sources::SourceRegistry;
use hq_sources::fake::{FakeCommands, FakeOpener};

const DEFINITION: &str = r#"
name = "Portaal"
requirements = ["TrackBugs", "TrackActions"]

[sources.jira]
kind = "jira"
url = "http://jira/"

[sources.junit]
kind = "junit"
url = "http://ci/"

[sources.happy]
kind = "happiness"
url = "http://happy"

[metric_sources]
bug_tracker = ["jira"]
unit_test_report = ["junit"]
team_spirit = ["happy"]

[metric_source_ids]
jira = "project = X"

[metric_options.OpenBugs]
low_target = 150
comment = "Veel legacy."

[[products]]
name = "Backend"
short_name = "BE"
kind = "component"
metric_source_ids = { junit = "http://ci/reports/junit/junit.xml" }

[[products]]
name = "Frontend"
short_name = "FE"
kind = "component"
metric_source_ids = { junit = "http://ci/reports/missing.xml" }

[[products]]
name = "Docs"
short_name = "DO"
kind = "component"

[[teams]]
name = "Alpha"
short_name = "AL"
requirements = ["TrackSpirit"]
metric_source_ids = { happy = "alpha" }
"#;

const JUNIT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuites>
  <testsuite name="unit" tests="10" errors="1" skipped="2" timestamp="2024-05-02T08:15:00">
    <testcase name="a"><failure message="expected 1"/></testcase>
  </testsuite>
  <testsuite name="api" tests="4" timestamp="2024-05-01T22:00:00">
    <testcase name="c"><failure/></testcase>
  </testsuite>
</testsuites>"#;

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 11)
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .expect("valid date")
}

fn project() -> Project {
    let definition: ProjectDefinition = toml::from_str(DEFINITION).expect("valid toml");
    Project::from_definition(definition, Path::new(".")).expect("valid project")
}

fn registry(project: &Project) -> SourceRegistry {
    let opener = FakeOpener::new()
        .with(
            "http://jira/rest/api/2/search?maxResults=1000&jql=project%20%3D%20X",
            r#"{"total": 2, "issues": [
                {"key": "X-1", "fields": {"summary": "Login faalt"}},
                {"key": "X-2", "fields": {"summary": "Logout faalt"}}
            ]}"#,
        )
        .with("http://ci/reports/junit/junit.xml", JUNIT)
        .with(
            "http://happy/api/",
            r#"[{"smiley": 4, "datum": "2024-05-01"}, {"smiley": "2", "datum": "2024-05-03"}]"#,
        );
    SourceRegistry::with_opener(project, Arc::new(opener))
}

fn find<'a>(metrics: &'a [Metric], kind: MetricKind, subject: &str) -> &'a Metric {
    metrics
        .iter()
        .find(|metric| metric.kind == kind && metric.subject_name == subject)
        .unwrap_or_else(|| panic!("no {kind} for {subject}"))
}

fn all_metrics(project: &Project, context: &MetricContext<'_>) -> Vec<Metric> {
    project
        .subjects()
        .flat_map(|subject| subject_metrics(subject, context))
        .collect()
}

#[test]
fn open_bugs_with_adapted_norm() {
    let project = project();
    let sources = registry(&project);
    let context = MetricContext::new(&project, &sources, now());
    let metrics = all_metrics(&project, &context);

    let bugs = find(&metrics, MetricKind::OpenBugs, "Portaal");
    assert_eq!(bugs.value, Some(MetricValue::Integer(2)));
    assert_eq!(bugs.status, Status::Green);
    assert_eq!(bugs.report, "Het aantal open bugreports is 2.");
    assert_eq!(
        bugs.norm,
        "Het aantal open bugreports is minder dan 50. Meer dan 150 open bugreports is rood."
    );
    assert_eq!(
        bugs.comment,
        "De norm is aangepast van 100 open bugreports (default) naar 150 open bugreports. Veel legacy."
    );
    assert_eq!(
        bugs.urls,
        vec![(
            "Jira filter".to_string(),
            "http://jira/issues/?jql=project%20%3D%20X".to_string()
        )]
    );
    insta::assert_json_snapshot!(bugs.extra_info, @r#"
    {
      "headers": {
        "issue": "Issue"
      },
      "title": "Lijst van issues",
      "data": [
        {
          "issue": {
            "href": "http://jira/browse/X-1",
            "text": "Login faalt"
          }
        },
        {
          "issue": {
            "href": "http://jira/browse/X-2",
            "text": "Logout faalt"
          }
        }
      ]
    }
    "#);
}

#[test]
fn unit_tests_report_failures_and_skips() {
    let project = project();
    let sources = registry(&project);
    let context = MetricContext::new(&project, &sources, now());
    let metrics = all_metrics(&project, &context);

    let failing = find(&metrics, MetricKind::FailingUnittests, "Backend");
    assert_eq!(failing.value, Some(MetricValue::Integer(3)));
    assert_eq!(failing.status, Status::Red);
    assert_eq!(
        failing.report,
        "3 van de 14 unittesten falen. 2 van de 14 unittesten zijn overgeslagen."
    );

    let age = find(&metrics, MetricKind::UnittestReportAge, "Backend");
    assert_eq!(age.value, Some(MetricValue::Integer(9)));
    assert_eq!(age.status, Status::Red);
    assert_eq!(age.report, "Het meest recente unittest rapport van Backend is 9 dagen oud.");
}

#[test]
fn unavailable_and_unconfigured_sources() {
    let project = project();
    let sources = registry(&project);
    let context = MetricContext::new(&project, &sources, now());
    let metrics = all_metrics(&project, &context);

    let unreadable = find(&metrics, MetricKind::FailingUnittests, "Frontend");
    assert_eq!(unreadable.status, Status::Missing);
    assert_eq!(unreadable.value, None);
    assert_eq!(
        unreadable.report,
        "De hoeveelheid falende unittesten van Frontend kon niet gemeten worden omdat niet alle \
         benodigde bronnen beschikbaar zijn."
    );

    let without_ids = find(&metrics, MetricKind::FailingUnittests, "Docs");
    assert_eq!(without_ids.status, Status::MissingSource);
    assert_eq!(
        without_ids.report,
        "De hoeveelheid falende unittesten van Docs kon niet gemeten worden omdat niet alle \
         benodigde bron-ids zijn geconfigureerd. Configureer ids voor de bron UnitTestReport."
    );

    let unconfigured = find(&metrics, MetricKind::ActionActivity, "Portaal");
    assert_eq!(unconfigured.status, Status::MissingSource);
    assert!(unconfigured.urls.is_empty());
    assert_eq!(
        unconfigured.report,
        "De actualiteit van de actielijst van Portaal kon niet gemeten worden omdat de bron \
         ActionLog niet is geconfigureerd."
    );
}

#[test]
fn team_spirit_is_a_smiley() {
    let project = project();
    let sources = registry(&project);
    let context = MetricContext::new(&project, &sources, now());
    let metrics = all_metrics(&project, &context);

    let spirit = find(&metrics, MetricKind::TeamSpirit, "Alpha");
    assert_eq!(spirit.value, Some(MetricValue::from(":-(")));
    assert_eq!(spirit.status, Status::Red);
    assert_eq!(spirit.report, "De stemming van team Alpha is :-(.");
    assert!((spirit.numerical_value() - 0.0).abs() < f64::EPSILON);
    assert_eq!(spirit.y_axis_range(), (0.0, 2.0));

    let age = find(&metrics, MetricKind::TeamSpiritAge, "Alpha");
    assert_eq!(age.value, Some(MetricValue::Integer(8)));
    assert_eq!(age.status, Status::Green);
}

#[test]
fn meta_metrics_count_statuses() {
    let project = project();
    let sources = registry(&project);
    let context = MetricContext::new(&project, &sources, now());
    let metrics = vec![
        Metric::measure(MetricKind::OpenBugs, &project.subject, &context),
        Metric::measure(MetricKind::ActionActivity, &project.subject, &context),
    ];

    let meta = meta_metrics(&metrics, &context);
    let kinds: Vec<MetricKind> = meta.iter().map(|metric| metric.kind).collect();
    assert_eq!(kinds, MetricKind::META.to_vec());

    let green = &meta[0];
    assert_eq!(green.value, Some(MetricValue::Integer(50)));
    assert_eq!(green.status, Status::Red);
    assert_eq!(green.report, "50% van de metrieken (1 van de 2) scoort boven de norm.");
    assert_eq!(green.stable_id(), "GreenMetaMetric");

    let missing = &meta[4];
    assert_eq!(missing.value, Some(MetricValue::Integer(50)));
    assert_eq!(
        missing.report,
        "50% van de metrieken (1 van de 2) kan niet gemeten worden."
    );
}

#[test]
fn history_gives_trend_and_status_start() {
    let project = project();
    let sources = registry(&project);
    let earlier = NaiveDate::from_ymd_opt(2024, 5, 1)
        .and_then(|date| date.and_hms_opt(9, 30, 0))
        .expect("valid date");
    let mut history = CompactHistory::new("history.json");
    history.add_metrics(
        earlier,
        [MetricRecord {
            stable_id: "OpenBugsPortaal".to_string(),
            value: Some(4.0),
            status: Status::Green,
        }],
    );
    let context = MetricContext::new(&project, &sources, now()).with_history(&history);

    let bugs = Metric::measure(MetricKind::OpenBugs, &project.subject, &context);
    assert_eq!(bugs.stable_id(), "OpenBugsPortaal");
    assert_eq!(bugs.recent_history, vec![4.0]);
    assert_eq!(bugs.status_start_date, Some(earlier));
    assert_eq!(bugs.y_axis_range(), (3.0, 5.0));
    assert_eq!(
        bugs.to_record(),
        MetricRecord {
            stable_id: "OpenBugsPortaal".to_string(),
            value: Some(2.0),
            status: Status::Green,
        }
    );
}

fn history_of(stable_id: &str, values: &[Option<f64>]) -> CompactHistory {
    let mut history = CompactHistory::new("history.json");
    for (day, value) in (1..).zip(values) {
        let date = NaiveDate::from_ymd_opt(2024, 5, day)
            .and_then(|date| date.and_hms_opt(9, 0, 0))
            .expect("valid date");
        history.add_metrics(
            date,
            [MetricRecord {
                stable_id: stable_id.to_string(),
                value: *value,
                status: Status::Green,
            }],
        );
    }
    history
}

#[test]
fn y_axis_range_spans_recent_values_including_missing_runs() {
    let project = project();
    let sources = registry(&project);
    let context = MetricContext::new(&project, &sources, now());

    let mut coverage =
        Metric::measure(MetricKind::UnittestLineCoverage, &project.subject, &context);
    assert_eq!(coverage.y_axis_range(), (0.0, 100.0));
    let history = history_of(coverage.stable_id(), &[Some(40.0), Some(60.0), Some(40.0)]);
    coverage.read_history(&history, now());
    assert_eq!(coverage.recent_history, vec![40.0, 60.0, 40.0]);
    assert_eq!(coverage.y_axis_range(), (40.0, 60.0));

    let mut bugs = Metric::measure(MetricKind::OpenBugs, &project.subject, &context);
    let history = history_of(bugs.stable_id(), &[Some(5.0), None, Some(5.0)]);
    bugs.read_history(&history, now());
    assert_eq!(bugs.recent_history, vec![5.0, -1.0, 5.0]);
    assert_eq!(bugs.y_axis_range(), (-1.0, 5.0));
}

#[test]
fn ratio_metrics_chart_the_full_percentage_range() {
    let project = project();
    let sources = registry(&project);
    let context = MetricContext::new(&project, &sources, now());
    let metrics = vec![Metric::measure(MetricKind::OpenBugs, &project.subject, &context)];

    let mut green = meta_metrics(&metrics, &context).remove(0);
    let history = history_of(green.stable_id(), &[Some(40.0), Some(60.0)]);
    green.read_history(&history, now());
    assert_eq!(green.recent_history, vec![40.0, 60.0]);
    assert_eq!(green.y_axis_range(), (0.0, 100.0));

    let mut commented = Metric::measure(MetricKind::CommentedLoc, &project.subject, &context);
    let history = history_of(commented.stable_id(), &[Some(4.0), Some(6.0)]);
    commented.read_history(&history, now());
    assert_eq!(commented.y_axis_range(), (0.0, 100.0));
}

#[test]
fn rereading_history_includes_the_current_run() {
    let project = project();
    let sources = registry(&project);
    let mut history = CompactHistory::new("history.json");
    let context = MetricContext::new(&project, &sources, now()).with_history(&history);
    let mut bugs = Metric::measure(MetricKind::OpenBugs, &project.subject, &context);
    assert!(bugs.recent_history.is_empty());
    assert_eq!(bugs.status_start_date, Some(now()));

    history.add_metrics(now(), [bugs.to_record()]);
    bugs.read_history(&history, now());
    assert_eq!(bugs.recent_history, vec![2.0]);
    assert_eq!(bugs.status_start_date, Some(now()));
}

#[test]
fn normalized_stable_id_encodes_replaced_characters() {
    let project = project();
    let sources = registry(&project);
    let context = MetricContext::new(&project, &sources, now());
    let mut team = project.teams[0].clone();
    team.name = "Team A-1".to_string();

    let metric = Metric::measure(MetricKind::TeamSpiritAge, &team, &context);
    assert_eq!(metric.stable_id(), "TeamSpiritAgeTeam A-1");
    assert_eq!(metric.normalized_stable_id(), "TeamSpiritAgeTeam_A_1_3245");
}

const COVERAGE_DEFINITION: &str = r#"
name = "Portaal"

[sources.jacoco]
kind = "jacoco"
url = "http://ci/"

[sources.repo]
kind = "git"
url = "https://git.example.org/portaal.git"

[metric_sources]
coverage_report = ["jacoco"]
version_control_system = ["repo"]

[[products]]
name = "Backend"
short_name = "BE"
kind = "component"
requirements = ["ARTCoverage"]

[products.metric_source_ids]
jacoco = "http://ci/jacoco/index.html"
repo = "https://git.example.org/portaal"

[products.metric_options.UnmergedBranches]
branches_to_ignore_re = "origin/release-"
"#;

const JACOCO: &str = r#"<table><tfoot><tr><td>Total</td><td>30 of 200</td><td>85%</td>
<td>45 of 100</td><td>55%</td></tr></tfoot></table>"#;

const JACOCO_SESSIONS: &str = r#"<table><tbody>
<tr><td>it-run</td><td>May 9, 2024 9:00:00 AM</td><td>May 9, 2024 10:00:00 AM</td></tr>
</tbody></table>"#;

const LAST_CHANGE: i64 = 1_715_000_000;

fn coverage_metrics(checkout_dir: &Path) -> Vec<Metric> {
    let definition: ProjectDefinition = toml::from_str(COVERAGE_DEFINITION).expect("valid toml");
    let mut project =
        Project::from_definition(definition, Path::new(".")).expect("valid project");
    if let Some(repo) = project.sources.get_mut("repo") {
        repo.checkout_dir = Some(checkout_dir.to_path_buf());
    }
    let opener = FakeOpener::new()
        .with("http://ci/jacoco/index.html", JACOCO)
        .with("http://ci/jacoco/jacoco-sessions.html", JACOCO_SESSIONS);
    let commands = FakeCommands::new()
        .with("clone", "")
        .with(
            "branch --list --remote --no-color",
            "  origin/HEAD -> origin/master\n  origin/master\n  origin/feature\n  \
             origin/release-1\n  origin/done\n",
        )
        .with(
            "branch --list --remote --no-color --no-merged",
            "  origin/feature\n  origin/release-1\n",
        )
        .with("cherry origin/master origin/feature", "+ 1a2b3c\n+ 4d5e6f\n+ 7a8b9c\n")
        .with("log --format=%ct -n 1 origin/feature", format!("{LAST_CHANGE}\n"));
    let sources = SourceRegistry::with_runners(&project, Arc::new(opener), Arc::new(commands));
    let context = MetricContext::new(&project, &sources, now());
    all_metrics(&project, &context)
}

#[test]
fn art_coverage_from_jacoco() {
    let checkout_dir = tempfile::tempdir().expect("temp dir");
    let metrics = coverage_metrics(checkout_dir.path());

    let statements = find(&metrics, MetricKind::ArtStatementCoverage, "Backend");
    assert_eq!(statements.value, Some(MetricValue::Integer(85)));
    assert_eq!(statements.status, Status::Green);
    assert_eq!(statements.report, "Backend ART statement coverage is 85%.");
    assert_eq!(
        statements.norm,
        "Minimaal 80% van de statements wordt gedekt door geautomatiseerde functionele tests. \
         Minder dan 70% is rood."
    );

    let branches = find(&metrics, MetricKind::ArtBranchCoverage, "Backend");
    assert_eq!(branches.value, Some(MetricValue::Integer(55)));
    assert_eq!(branches.status, Status::Red);
    assert_eq!(branches.report, "Backend ART branch coverage is 55%.");

    let age = find(&metrics, MetricKind::ArtCoverageReportAge, "Backend");
    assert_eq!(age.value, Some(MetricValue::Integer(2)));
    assert_eq!(age.status, Status::Green);
    assert_eq!(
        age.report,
        "De coveragerapportage van Backend is 2 dagen geleden gemaakt."
    );
}

#[test]
fn unmerged_branches_skip_ignored_branches() {
    let checkout_dir = tempfile::tempdir().expect("temp dir");
    let metrics = coverage_metrics(checkout_dir.path());

    let unmerged = find(&metrics, MetricKind::UnmergedBranches, "Backend");
    assert_eq!(unmerged.value, Some(MetricValue::Integer(1)));
    assert_eq!(unmerged.status, Status::Yellow);
    assert_eq!(
        unmerged.report,
        "1 van de 3 branches van Backend hebben revisies die niet zijn gemerged."
    );
    assert_eq!(
        unmerged.comment,
        "Branches die voldoen aan de reguliere expressie origin/release- zijn genegeerd."
    );

    let info = unmerged.extra_info.as_ref().expect("branch details");
    assert_eq!(info.title, "Niet gemergde branches");
    let last_change = from_timestamp_secs(LAST_CHANGE)
        .expect("valid timestamp")
        .format("%d-%m-%Y")
        .to_string();
    assert_eq!(
        info.rows(),
        [vec![
            Cell::link("https://git.example.org/portaal/origin/feature", "origin/feature"),
            Cell::from(3),
            Cell::from(last_change),
        ]]
    );
}
