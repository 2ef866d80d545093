//! Metric source configuration.
//!
//! A project configures named source instances (`[sources.<id>]`). Each
//! instance has a [`SourceKind`] that selects the adapter, and is assigned
//! to one or more [`SourceRole`]s through `[metric_sources]`. Metrics ask
//! for a role, never for a concrete kind.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The external system behind a source instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Sonar,
    Jenkins,
    JenkinsTestReport,
    Junit,
    GitlabCi,
    Jira,
    Trello,
    OwaspDependencyXml,
    ZapScanReport,
    Checkmarx,
    Happiness,
    Jacoco,
    Lcov,
    Git,
    RobotFramework,
    Testng,
}

impl SourceKind {
    pub const ALL: [SourceKind; 16] = [
        SourceKind::Sonar,
        SourceKind::Jenkins,
        SourceKind::JenkinsTestReport,
        SourceKind::Junit,
        SourceKind::GitlabCi,
        SourceKind::Jira,
        SourceKind::Trello,
        SourceKind::OwaspDependencyXml,
        SourceKind::ZapScanReport,
        SourceKind::Checkmarx,
        SourceKind::Happiness,
        SourceKind::Jacoco,
        SourceKind::Lcov,
        SourceKind::Git,
        SourceKind::RobotFramework,
        SourceKind::Testng,
    ];

    /// Display name of the adapter.
    pub fn name(self) -> &'static str {
        match self {
            SourceKind::Sonar => "SonarQube",
            SourceKind::Jenkins => "Jenkins build server",
            SourceKind::JenkinsTestReport => "Jenkins testreport",
            SourceKind::Junit => "JUnit test report",
            SourceKind::GitlabCi => "GitLab CI",
            SourceKind::Jira => "Jira filter",
            SourceKind::Trello => "Trello",
            SourceKind::OwaspDependencyXml => "OWASP dependency XML report",
            SourceKind::ZapScanReport => "ZAP Scan rapport",
            SourceKind::Checkmarx => "Checkmarx",
            SourceKind::Happiness => "Happiness",
            SourceKind::Jacoco => "JaCoCo coverage rapport",
            SourceKind::Lcov => "LCOV coverage rapport",
            SourceKind::Git => "Git",
            SourceKind::RobotFramework => "Robot Framework test report",
            SourceKind::Testng => "TestNG test report",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The abstract role a source plays for a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceRole {
    Sonar,
    UnitTestReport,
    SystemTestReport,
    CiServer,
    BugTracker,
    SecurityBugTracker,
    TechnicalDebtTracker,
    ReadyUserStoryPointsTracker,
    UserStoriesInProgressTracker,
    UserStoriesDurationTracker,
    UserStoryWithoutSecurityRiskAssessmentTracker,
    UserStoryWithoutPerformanceRiskAssessmentTracker,
    ActionLog,
    RiskLog,
    OwaspDependencyReport,
    ZapScanReport,
    Checkmarx,
    TeamSpirit,
    CoverageReport,
    VersionControlSystem,
}

impl SourceRole {
    pub const ALL: [SourceRole; 20] = [
        SourceRole::Sonar,
        SourceRole::UnitTestReport,
        SourceRole::SystemTestReport,
        SourceRole::CiServer,
        SourceRole::BugTracker,
        SourceRole::SecurityBugTracker,
        SourceRole::TechnicalDebtTracker,
        SourceRole::ReadyUserStoryPointsTracker,
        SourceRole::UserStoriesInProgressTracker,
        SourceRole::UserStoriesDurationTracker,
        SourceRole::UserStoryWithoutSecurityRiskAssessmentTracker,
        SourceRole::UserStoryWithoutPerformanceRiskAssessmentTracker,
        SourceRole::ActionLog,
        SourceRole::RiskLog,
        SourceRole::OwaspDependencyReport,
        SourceRole::ZapScanReport,
        SourceRole::Checkmarx,
        SourceRole::TeamSpirit,
        SourceRole::CoverageReport,
        SourceRole::VersionControlSystem,
    ];

    /// Key used in the `[metric_sources]` table.
    pub fn key(self) -> &'static str {
        match self {
            SourceRole::Sonar => "sonar",
            SourceRole::UnitTestReport => "unit_test_report",
            SourceRole::SystemTestReport => "system_test_report",
            SourceRole::CiServer => "ci_server",
            SourceRole::BugTracker => "bug_tracker",
            SourceRole::SecurityBugTracker => "security_bug_tracker",
            SourceRole::TechnicalDebtTracker => "technical_debt_tracker",
            SourceRole::ReadyUserStoryPointsTracker => "ready_user_story_points_tracker",
            SourceRole::UserStoriesInProgressTracker => "user_stories_in_progress_tracker",
            SourceRole::UserStoriesDurationTracker => "user_stories_duration_tracker",
            SourceRole::UserStoryWithoutSecurityRiskAssessmentTracker => {
                "user_story_without_security_risk_assessment_tracker"
            }
            SourceRole::UserStoryWithoutPerformanceRiskAssessmentTracker => {
                "user_story_without_performance_risk_assessment_tracker"
            }
            SourceRole::ActionLog => "action_log",
            SourceRole::RiskLog => "risk_log",
            SourceRole::OwaspDependencyReport => "owasp_dependency_report",
            SourceRole::ZapScanReport => "zap_scan_report",
            SourceRole::Checkmarx => "checkmarx",
            SourceRole::TeamSpirit => "team_spirit",
            SourceRole::CoverageReport => "coverage_report",
            SourceRole::VersionControlSystem => "version_control_system",
        }
    }

    /// Class-like name used in report texts.
    pub fn name(self) -> &'static str {
        match self {
            SourceRole::Sonar => "Sonar",
            SourceRole::UnitTestReport => "UnitTestReport",
            SourceRole::SystemTestReport => "SystemTestReport",
            SourceRole::CiServer => "CIServer",
            SourceRole::BugTracker => "BugTracker",
            SourceRole::SecurityBugTracker => "SecurityBugTracker",
            SourceRole::TechnicalDebtTracker => "TechnicalDebtTracker",
            SourceRole::ReadyUserStoryPointsTracker => "ReadyUserStoryPointsTracker",
            SourceRole::UserStoriesInProgressTracker => "UserStoriesInProgressTracker",
            SourceRole::UserStoriesDurationTracker => "UserStoriesDurationTracker",
            SourceRole::UserStoryWithoutSecurityRiskAssessmentTracker => {
                "UserStoryWithoutSecurityRiskAssessmentTracker"
            }
            SourceRole::UserStoryWithoutPerformanceRiskAssessmentTracker => {
                "UserStoryWithoutPerformanceRiskAssessmentTracker"
            }
            SourceRole::ActionLog => "ActionLog",
            SourceRole::RiskLog => "RiskLog",
            SourceRole::OwaspDependencyReport => "OWASPDependencyReport",
            SourceRole::ZapScanReport => "ZAPScanReport",
            SourceRole::Checkmarx => "Checkmarx",
            SourceRole::TeamSpirit => "TeamSpirit",
            SourceRole::CoverageReport => "CoverageReport",
            SourceRole::VersionControlSystem => "VersionControlSystem",
        }
    }

    /// Whether a source of `kind` can fill this role.
    pub fn accepts(self, kind: SourceKind) -> bool {
        match self {
            SourceRole::Sonar => kind == SourceKind::Sonar,
            SourceRole::UnitTestReport => kind == SourceKind::Sonar || is_test_report(kind),
            SourceRole::SystemTestReport => is_test_report(kind),
            SourceRole::CiServer => matches!(kind, SourceKind::Jenkins | SourceKind::GitlabCi),
            SourceRole::BugTracker
            | SourceRole::SecurityBugTracker
            | SourceRole::TechnicalDebtTracker
            | SourceRole::ReadyUserStoryPointsTracker
            | SourceRole::UserStoriesInProgressTracker
            | SourceRole::UserStoriesDurationTracker
            | SourceRole::UserStoryWithoutSecurityRiskAssessmentTracker
            | SourceRole::UserStoryWithoutPerformanceRiskAssessmentTracker => {
                kind == SourceKind::Jira
            }
            SourceRole::ActionLog | SourceRole::RiskLog => kind == SourceKind::Trello,
            SourceRole::OwaspDependencyReport => kind == SourceKind::OwaspDependencyXml,
            SourceRole::ZapScanReport => kind == SourceKind::ZapScanReport,
            SourceRole::Checkmarx => kind == SourceKind::Checkmarx,
            SourceRole::TeamSpirit => kind == SourceKind::Happiness,
            SourceRole::CoverageReport => matches!(kind, SourceKind::Jacoco | SourceKind::Lcov),
            SourceRole::VersionControlSystem => kind == SourceKind::Git,
        }
    }
}

fn is_test_report(kind: SourceKind) -> bool {
    matches!(
        kind,
        SourceKind::Junit
            | SourceKind::JenkinsTestReport
            | SourceKind::RobotFramework
            | SourceKind::Testng
    )
}

impl fmt::Display for SourceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SourceRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceRole::ALL
            .into_iter()
            .find(|role| role.key() == s)
            .ok_or_else(|| format!("unknown metric source role: {s}"))
    }
}

/// Configuration of one source instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub kind: Option<SourceKind>,
    /// Base url of the system (or url of the report for file-like sources).
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Environment variable holding the password.
    #[serde(default)]
    pub password_env: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    /// Environment variable holding the token.
    #[serde(default)]
    pub token_env: Option<String>,
    /// Job name filter for CI servers.
    #[serde(default)]
    pub job_re: Option<String>,
    /// Trello application key.
    #[serde(default)]
    pub appkey: Option<String>,
    /// Trello lists whose cards are ignored.
    #[serde(default)]
    pub lists_to_ignore: Vec<String>,
    /// Jira field summed by story point metrics.
    #[serde(default)]
    pub field_name: Option<String>,
    /// Fingerprints of ZAP alert instances marked as false positive.
    #[serde(default)]
    pub false_positives: Vec<String>,
    /// Git branch to check out instead of the default branch.
    #[serde(default)]
    pub branch: Option<String>,
    /// Directory that holds Git checkouts, relative to the project file.
    #[serde(default)]
    pub checkout_dir: Option<PathBuf>,
}

impl SourceConfig {
    /// Password from the configuration, or from the environment variable it names.
    pub fn resolved_password(&self) -> Option<String> {
        resolve_secret(self.password.as_ref(), self.password_env.as_ref())
    }

    /// Token from the configuration, or from the environment variable it names.
    pub fn resolved_token(&self) -> Option<String> {
        resolve_secret(self.token.as_ref(), self.token_env.as_ref())
    }
}

fn resolve_secret(value: Option<&String>, env: Option<&String>) -> Option<String> {
    if let Some(value) = value {
        return Some(value.clone());
    }
    let name = env?;
    match std::env::var(name) {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = %name, "Environment variable for credentials is not set");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_keys_parse() {
        for role in SourceRole::ALL {
            assert_eq!(role.key().parse::<SourceRole>(), Ok(role));
        }
        assert!("wiki".parse::<SourceRole>().is_err());
    }

    #[test]
    fn roles_accept_expected_kinds() {
        assert!(SourceRole::UnitTestReport.accepts(SourceKind::Sonar));
        assert!(!SourceRole::SystemTestReport.accepts(SourceKind::Sonar));
        assert!(SourceRole::CiServer.accepts(SourceKind::GitlabCi));
        assert!(SourceRole::RiskLog.accepts(SourceKind::Trello));
        assert!(!SourceRole::BugTracker.accepts(SourceKind::Trello));
        assert!(SourceRole::SystemTestReport.accepts(SourceKind::RobotFramework));
        assert!(SourceRole::UnitTestReport.accepts(SourceKind::Testng));
        assert!(SourceRole::CoverageReport.accepts(SourceKind::Lcov));
        assert!(!SourceRole::CoverageReport.accepts(SourceKind::Sonar));
        assert!(SourceRole::VersionControlSystem.accepts(SourceKind::Git));
    }

    #[test]
    fn explicit_secret_wins() {
        let config = SourceConfig {
            password: Some("secret".to_string()),
            password_env: Some("HQ_TEST_UNUSED_VARIABLE".to_string()),
            ..SourceConfig::default()
        };
        assert_eq!(config.resolved_password().as_deref(), Some("secret"));
        assert_eq!(config.resolved_token(), None);
    }
}
