//! Integration tests for building sources from a project definition.

use std::path::Path;
use std::sync::Arc;

use hq_model::{Project, ProjectDefinition, SourceKind, SourceRole};
use hq_sources::SourceRegistry;
use hq_sources::fake::FakeOpener;

const DEFINITION: &str = r#"
name = "Portaal"

[sources.sonar]
kind = "sonar"
url = "http://sonar/"

[sources.junit]
kind = "junit"
url = "http://ci/"

[sources.jenkins]
kind = "jenkins"
url = "http://jenkins/"
job_re = "portaal-"

[sources.jira]
kind = "jira"
url = "http://jira/"

[sources.gitlab]
kind = "gitlab_ci"
url = "http://gitlab/"
job_re = "("

[metric_sources]
sonar = ["sonar"]
unit_test_report = ["sonar", "junit"]
ci_server = ["jenkins", "gitlab"]
bug_tracker = ["jira"]
"#;

fn project() -> Project {
    let definition: ProjectDefinition = toml::from_str(DEFINITION).expect("valid toml");
    Project::from_definition(definition, Path::new(".")).expect("valid project")
}

#[test]
fn sources_are_built_per_configured_id() {
    let registry = SourceRegistry::with_opener(&project(), Arc::new(FakeOpener::new()));

    assert_eq!(registry.get("sonar").map(|source| source.kind()), Some(SourceKind::Sonar));
    assert!(registry.get("jira").and_then(|source| source.as_jira()).is_some());
    assert!(registry.get("jenkins").and_then(|source| source.as_ci_server()).is_some());
    assert!(registry.get("junit").and_then(|source| source.as_ci_server()).is_none());
}

#[test]
fn invalid_sources_are_left_out() {
    let registry = SourceRegistry::with_opener(&project(), Arc::new(FakeOpener::new()));
    assert!(registry.get("gitlab").is_none());
    assert_eq!(registry.len(), 4);
    assert_eq!(
        registry.ids().collect::<Vec<_>>(),
        vec!["jenkins", "jira", "junit", "sonar"]
    );
}

#[test]
fn roles_keep_configuration_order() {
    let registry = SourceRegistry::with_opener(&project(), Arc::new(FakeOpener::new()));

    let unit_tests: Vec<&str> = registry
        .for_role(SourceRole::UnitTestReport)
        .into_iter()
        .map(|(id, source)| {
            assert!(source.as_test_report().is_some());
            id
        })
        .collect();
    assert_eq!(unit_tests, vec!["sonar", "junit"]);

    let ci: Vec<&str> = registry
        .for_role(SourceRole::CiServer)
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    assert_eq!(ci, vec!["jenkins"]);
    assert!(registry.for_role(SourceRole::ActionLog).is_empty());
}

#[test]
fn coverage_and_version_control_sources_are_built() {
    let definition: ProjectDefinition = toml::from_str(
        r#"
        name = "Portaal"

        [sources.jacoco]
        kind = "jacoco"
        url = "http://ci/jacoco/"

        [sources.lcov]
        kind = "lcov"
        url = "http://ci/lcov/"

        [sources.robot]
        kind = "robot_framework"
        url = "http://ci/robot/"

        [sources.repo]
        kind = "git"
        url = "https://git.example.org/portaal"
        branch = "develop"
        checkout_dir = "repos"

        [metric_sources]
        coverage_report = ["jacoco", "lcov"]
        system_test_report = ["robot"]
        version_control_system = ["repo"]
        "#,
    )
    .expect("valid toml");
    let project = Project::from_definition(definition, Path::new("/projects/portaal"))
        .expect("valid project");
    let registry = SourceRegistry::with_opener(&project, Arc::new(FakeOpener::new()));

    let coverage: Vec<&str> = registry
        .for_role(SourceRole::CoverageReport)
        .into_iter()
        .filter(|(_, source)| source.as_coverage_report().is_some())
        .map(|(id, _)| id)
        .collect();
    assert_eq!(coverage, vec!["jacoco", "lcov"]);
    assert!(registry.get("robot").and_then(|source| source.as_test_report()).is_some());
    let git = registry.get("repo").and_then(|source| source.as_git()).expect("git source");
    assert_eq!(git.branch(), Some("develop"));
    assert_eq!(
        git.repo_folder(),
        Path::new("/projects/portaal/repos/portaal-develop")
    );
}
