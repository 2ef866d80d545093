//! Quality requirements and the subjects they apply to.
//!
//! A requirement bundles a set of metrics. Each subject kind has default
//! requirements that are measured unless removed, and optional requirements
//! that are measured only when added in the project definition.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of thing a metric is measured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Project,
    Application,
    Component,
    Environment,
    Team,
}

impl SubjectKind {
    pub const ALL: [SubjectKind; 5] = [
        SubjectKind::Project,
        SubjectKind::Application,
        SubjectKind::Component,
        SubjectKind::Environment,
        SubjectKind::Team,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SubjectKind::Project => "Project",
            SubjectKind::Application => "Application",
            SubjectKind::Component => "Component",
            SubjectKind::Environment => "Environment",
            SubjectKind::Team => "Team",
        }
    }

    pub fn default_requirements(self) -> &'static [Requirement] {
        match self {
            SubjectKind::Component => &[
                Requirement::CodeQuality,
                Requirement::ViolationsBySeverity,
                Requirement::UnitTests,
                Requirement::UnitTestCoverage,
                Requirement::TrackBranches,
            ],
            SubjectKind::Application => &[
                Requirement::CodeQuality,
                Requirement::Art,
                Requirement::ArtCoverage,
                Requirement::ViolationsBySeverity,
                Requirement::OwaspDependencies,
                Requirement::OwaspZap,
                Requirement::Checkmarx,
                Requirement::TrackBranches,
            ],
            SubjectKind::Project | SubjectKind::Environment | SubjectKind::Team => &[],
        }
    }

    pub fn optional_requirements(self) -> &'static [Requirement] {
        match self {
            SubjectKind::Component => &[
                Requirement::ViolationsByType,
                Requirement::OwaspDependencies,
                Requirement::OwaspZap,
                Requirement::Checkmarx,
            ],
            SubjectKind::Application => &[
                Requirement::UnitTests,
                Requirement::UnitTestCoverage,
                Requirement::ViolationsByType,
            ],
            SubjectKind::Project => &[
                Requirement::TrackActions,
                Requirement::TrackRisks,
                Requirement::TrackBugs,
                Requirement::TrackSecurityBugs,
                Requirement::TrackTechnicalDebt,
                Requirement::TrackReadyUs,
                Requirement::TrackSecurityAndPerformanceRisks,
                Requirement::TrackUserStoriesInProgress,
                Requirement::TrackDurationOfUserStories,
                Requirement::TrustedProductMaintainability,
            ],
            SubjectKind::Environment => {
                &[Requirement::TrackCiJobs, Requirement::TrackSonarVersion]
            }
            SubjectKind::Team => &[Requirement::TrackSpirit],
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A quality requirement.
///
/// Serialized by its identifier, e.g. `"TrackBugs"` or `"OWASPZAP"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Requirement {
    UnitTests,
    UnitTestCoverage,
    #[serde(rename = "ART")]
    Art,
    #[serde(rename = "ARTCoverage")]
    ArtCoverage,
    CodeQuality,
    ViolationsBySeverity,
    ViolationsByType,
    #[serde(rename = "OWASPDependencies")]
    OwaspDependencies,
    #[serde(rename = "OWASPZAP")]
    OwaspZap,
    Checkmarx,
    TrustedProductMaintainability,
    TrackBugs,
    TrackSecurityBugs,
    TrackTechnicalDebt,
    TrackActions,
    TrackRisks,
    #[serde(rename = "TrackReadyUS")]
    TrackReadyUs,
    TrackUserStoriesInProgress,
    TrackDurationOfUserStories,
    TrackSecurityAndPerformanceRisks,
    #[serde(rename = "TrackCIJobs")]
    TrackCiJobs,
    TrackSonarVersion,
    TrackSpirit,
    TrackBranches,
}

impl Requirement {
    pub const ALL: [Requirement; 24] = [
        Requirement::UnitTests,
        Requirement::UnitTestCoverage,
        Requirement::Art,
        Requirement::ArtCoverage,
        Requirement::CodeQuality,
        Requirement::ViolationsBySeverity,
        Requirement::ViolationsByType,
        Requirement::OwaspDependencies,
        Requirement::OwaspZap,
        Requirement::Checkmarx,
        Requirement::TrustedProductMaintainability,
        Requirement::TrackBugs,
        Requirement::TrackSecurityBugs,
        Requirement::TrackTechnicalDebt,
        Requirement::TrackActions,
        Requirement::TrackRisks,
        Requirement::TrackReadyUs,
        Requirement::TrackUserStoriesInProgress,
        Requirement::TrackDurationOfUserStories,
        Requirement::TrackSecurityAndPerformanceRisks,
        Requirement::TrackCiJobs,
        Requirement::TrackSonarVersion,
        Requirement::TrackSpirit,
        Requirement::TrackBranches,
    ];

    /// Identifier used in project definitions and in the meta data.
    pub fn id(self) -> &'static str {
        match self {
            Requirement::UnitTests => "UnitTests",
            Requirement::UnitTestCoverage => "UnitTestCoverage",
            Requirement::Art => "ART",
            Requirement::ArtCoverage => "ARTCoverage",
            Requirement::CodeQuality => "CodeQuality",
            Requirement::ViolationsBySeverity => "ViolationsBySeverity",
            Requirement::ViolationsByType => "ViolationsByType",
            Requirement::OwaspDependencies => "OWASPDependencies",
            Requirement::OwaspZap => "OWASPZAP",
            Requirement::Checkmarx => "Checkmarx",
            Requirement::TrustedProductMaintainability => "TrustedProductMaintainability",
            Requirement::TrackBugs => "TrackBugs",
            Requirement::TrackSecurityBugs => "TrackSecurityBugs",
            Requirement::TrackTechnicalDebt => "TrackTechnicalDebt",
            Requirement::TrackActions => "TrackActions",
            Requirement::TrackRisks => "TrackRisks",
            Requirement::TrackReadyUs => "TrackReadyUS",
            Requirement::TrackUserStoriesInProgress => "TrackUserStoriesInProgress",
            Requirement::TrackDurationOfUserStories => "TrackDurationOfUserStories",
            Requirement::TrackSecurityAndPerformanceRisks => "TrackSecurityAndPerformanceRisks",
            Requirement::TrackCiJobs => "TrackCIJobs",
            Requirement::TrackSonarVersion => "TrackSonarVersion",
            Requirement::TrackSpirit => "TrackSpirit",
            Requirement::TrackBranches => "TrackBranches",
        }
    }

    /// Dutch display name.
    pub fn name(self) -> &'static str {
        match self {
            Requirement::UnitTests => "Unit tests",
            Requirement::UnitTestCoverage => "Unit test coverage",
            Requirement::Art => "Automated regression tests",
            Requirement::ArtCoverage => "Automated regression test coverage",
            Requirement::CodeQuality => "Code quality",
            Requirement::ViolationsBySeverity => "Violations by severity",
            Requirement::ViolationsByType => "Violations by type",
            Requirement::OwaspDependencies => "OWASP dependency scan",
            Requirement::OwaspZap => "OWASP ZAP scan",
            Requirement::Checkmarx => "Checkmarx",
            Requirement::TrustedProductMaintainability => "Trusted Product Maintainability",
            Requirement::TrackBugs => "Track bugs",
            Requirement::TrackSecurityBugs => "Track security bugs",
            Requirement::TrackTechnicalDebt => "Track technical debt",
            Requirement::TrackActions => "Track actions",
            Requirement::TrackRisks => "Track risks",
            Requirement::TrackReadyUs => "Track ready user stories",
            Requirement::TrackUserStoriesInProgress => "Track user stories in progress",
            Requirement::TrackDurationOfUserStories => "Track duration of user stories",
            Requirement::TrackSecurityAndPerformanceRisks => {
                "Track security and performance risks"
            }
            Requirement::TrackCiJobs => "Track CI jobs",
            Requirement::TrackSonarVersion => "Track Sonar version",
            Requirement::TrackSpirit => "Track spirit",
            Requirement::TrackBranches => "Track branches",
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
