//! The metric classes.

use std::fmt;
use std::str::FromStr;

use hq_model::Requirement;

/// Every metric class the dashboard can measure.
///
/// The class name is part of the stable id of a metric and is the key for
/// metric options in the project definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricKind {
    // Product code
    ProductLoc,
    CommentedLoc,
    CyclomaticComplexity,
    LongMethods,
    ManyParameters,
    SonarAnalysisAge,
    BlockerViolations,
    CriticalViolations,
    MajorViolations,
    ViolationSuppressions,
    MaintainabilityBugs,
    Vulnerabilities,
    CodeSmells,
    UnittestLineCoverage,
    UnittestBranchCoverage,
    // Tests
    FailingUnittests,
    UnittestReportAge,
    FailingRegressionTests,
    RegressionTestAge,
    ArtStatementCoverage,
    ArtBranchCoverage,
    ArtCoverageReportAge,
    // Version control
    UnmergedBranches,
    // Security
    HighPriorityOwaspDependencyWarnings,
    NormalPriorityOwaspDependencyWarnings,
    OwaspDependencyReportAge,
    HighRiskZapScanAlerts,
    MediumRiskZapScanAlerts,
    HighRiskCheckmarxAlerts,
    MediumRiskCheckmarxAlerts,
    CheckmarxReportAge,
    // Project
    TotalLoc,
    OpenBugs,
    OpenSecurityBugs,
    TechnicalDebtIssues,
    ReadyUserStoryPoints,
    UserStoriesInProgress,
    UserStoriesDuration,
    UserStoriesWithoutSecurityRiskAssessment,
    UserStoriesWithoutPerformanceRiskAssessment,
    ActionActivity,
    OverDueActions,
    StaleActions,
    RiskLog,
    // Environment
    FailingCiJobs,
    UnusedCiJobs,
    SonarVersion,
    // Team
    TeamSpirit,
    TeamSpiritAge,
    // Meta
    GreenMetaMetric,
    RedMetaMetric,
    YellowMetaMetric,
    GreyMetaMetric,
    MissingMetaMetric,
}

impl MetricKind {
    pub const ALL: [MetricKind; 54] = [
        MetricKind::ProductLoc,
        MetricKind::CommentedLoc,
        MetricKind::CyclomaticComplexity,
        MetricKind::LongMethods,
        MetricKind::ManyParameters,
        MetricKind::SonarAnalysisAge,
        MetricKind::BlockerViolations,
        MetricKind::CriticalViolations,
        MetricKind::MajorViolations,
        MetricKind::ViolationSuppressions,
        MetricKind::MaintainabilityBugs,
        MetricKind::Vulnerabilities,
        MetricKind::CodeSmells,
        MetricKind::UnittestLineCoverage,
        MetricKind::UnittestBranchCoverage,
        MetricKind::FailingUnittests,
        MetricKind::UnittestReportAge,
        MetricKind::FailingRegressionTests,
        MetricKind::RegressionTestAge,
        MetricKind::ArtStatementCoverage,
        MetricKind::ArtBranchCoverage,
        MetricKind::ArtCoverageReportAge,
        MetricKind::UnmergedBranches,
        MetricKind::HighPriorityOwaspDependencyWarnings,
        MetricKind::NormalPriorityOwaspDependencyWarnings,
        MetricKind::OwaspDependencyReportAge,
        MetricKind::HighRiskZapScanAlerts,
        MetricKind::MediumRiskZapScanAlerts,
        MetricKind::HighRiskCheckmarxAlerts,
        MetricKind::MediumRiskCheckmarxAlerts,
        MetricKind::CheckmarxReportAge,
        MetricKind::TotalLoc,
        MetricKind::OpenBugs,
        MetricKind::OpenSecurityBugs,
        MetricKind::TechnicalDebtIssues,
        MetricKind::ReadyUserStoryPoints,
        MetricKind::UserStoriesInProgress,
        MetricKind::UserStoriesDuration,
        MetricKind::UserStoriesWithoutSecurityRiskAssessment,
        MetricKind::UserStoriesWithoutPerformanceRiskAssessment,
        MetricKind::ActionActivity,
        MetricKind::OverDueActions,
        MetricKind::StaleActions,
        MetricKind::RiskLog,
        MetricKind::FailingCiJobs,
        MetricKind::UnusedCiJobs,
        MetricKind::SonarVersion,
        MetricKind::TeamSpirit,
        MetricKind::TeamSpiritAge,
        MetricKind::GreenMetaMetric,
        MetricKind::RedMetaMetric,
        MetricKind::YellowMetaMetric,
        MetricKind::GreyMetaMetric,
        MetricKind::MissingMetaMetric,
    ];

    /// Meta metrics, in report order.
    pub const META: [MetricKind; 5] = [
        MetricKind::GreenMetaMetric,
        MetricKind::RedMetaMetric,
        MetricKind::YellowMetaMetric,
        MetricKind::GreyMetaMetric,
        MetricKind::MissingMetaMetric,
    ];

    /// Class name used in stable ids and metric options.
    pub fn class_name(self) -> &'static str {
        match self {
            MetricKind::ProductLoc => "ProductLOC",
            MetricKind::CommentedLoc => "CommentedLOC",
            MetricKind::CyclomaticComplexity => "CyclomaticComplexity",
            MetricKind::LongMethods => "LongMethods",
            MetricKind::ManyParameters => "ManyParameters",
            MetricKind::SonarAnalysisAge => "SonarAnalysisAge",
            MetricKind::BlockerViolations => "BlockerViolations",
            MetricKind::CriticalViolations => "CriticalViolations",
            MetricKind::MajorViolations => "MajorViolations",
            MetricKind::ViolationSuppressions => "ViolationSuppressions",
            MetricKind::MaintainabilityBugs => "MaintainabilityBugs",
            MetricKind::Vulnerabilities => "Vulnerabilities",
            MetricKind::CodeSmells => "CodeSmells",
            MetricKind::UnittestLineCoverage => "UnittestLineCoverage",
            MetricKind::UnittestBranchCoverage => "UnittestBranchCoverage",
            MetricKind::FailingUnittests => "FailingUnittests",
            MetricKind::UnittestReportAge => "UnittestReportAge",
            MetricKind::FailingRegressionTests => "FailingRegressionTests",
            MetricKind::RegressionTestAge => "RegressionTestAge",
            MetricKind::ArtStatementCoverage => "ARTStatementCoverage",
            MetricKind::ArtBranchCoverage => "ARTBranchCoverage",
            MetricKind::ArtCoverageReportAge => "ARTCoverageReportAge",
            MetricKind::UnmergedBranches => "UnmergedBranches",
            MetricKind::HighPriorityOwaspDependencyWarnings => "HighPriorityOWASPDependencyWarnings",
            MetricKind::NormalPriorityOwaspDependencyWarnings => "NormalPriorityOWASPDependencyWarnings",
            MetricKind::OwaspDependencyReportAge => "OWASPDependencyReportAge",
            MetricKind::HighRiskZapScanAlerts => "HighRiskZAPScanAlertsMetric",
            MetricKind::MediumRiskZapScanAlerts => "MediumRiskZAPScanAlertsMetric",
            MetricKind::HighRiskCheckmarxAlerts => "HighRiskCheckmarxAlertsMetric",
            MetricKind::MediumRiskCheckmarxAlerts => "MediumRiskCheckmarxAlertsMetric",
            MetricKind::CheckmarxReportAge => "CheckmarxReportAge",
            MetricKind::TotalLoc => "TotalLOC",
            MetricKind::OpenBugs => "OpenBugs",
            MetricKind::OpenSecurityBugs => "OpenSecurityBugs",
            MetricKind::TechnicalDebtIssues => "TechnicalDebtIssues",
            MetricKind::ReadyUserStoryPoints => "ReadyUserStoryPoints",
            MetricKind::UserStoriesInProgress => "UserStoriesInProgress",
            MetricKind::UserStoriesDuration => "UserStoriesDuration",
            MetricKind::UserStoriesWithoutSecurityRiskAssessment => {
                "UserStoriesWithoutSecurityRiskAssessment"
            }
            MetricKind::UserStoriesWithoutPerformanceRiskAssessment => {
                "UserStoriesWithoutPerformanceRiskAssessment"
            }
            MetricKind::ActionActivity => "ActionActivity",
            MetricKind::OverDueActions => "OverDueActions",
            MetricKind::StaleActions => "StaleActions",
            MetricKind::RiskLog => "RiskLog",
            MetricKind::FailingCiJobs => "FailingCIJobs",
            MetricKind::UnusedCiJobs => "UnusedCIJobs",
            MetricKind::SonarVersion => "SonarVersion",
            MetricKind::TeamSpirit => "TeamSpirit",
            MetricKind::TeamSpiritAge => "TeamSpiritAge",
            MetricKind::GreenMetaMetric => "GreenMetaMetric",
            MetricKind::RedMetaMetric => "RedMetaMetric",
            MetricKind::YellowMetaMetric => "YellowMetaMetric",
            MetricKind::GreyMetaMetric => "GreyMetaMetric",
            MetricKind::MissingMetaMetric => "MissingMetaMetric",
        }
    }

    pub fn is_meta(self) -> bool {
        Self::META.contains(&self)
    }

    /// Metrics computed as a numerator over a denominator, in percent.
    pub fn is_ratio(self) -> bool {
        self.is_meta()
            || matches!(
                self,
                MetricKind::CommentedLoc
                    | MetricKind::CyclomaticComplexity
                    | MetricKind::LongMethods
                    | MetricKind::ManyParameters
            )
    }

    /// The metrics a requirement brings, in report order.
    pub fn for_requirement(requirement: Requirement) -> &'static [MetricKind] {
        match requirement {
            Requirement::CodeQuality => &[
                MetricKind::CyclomaticComplexity,
                MetricKind::ProductLoc,
                MetricKind::LongMethods,
                MetricKind::ManyParameters,
                MetricKind::CommentedLoc,
                MetricKind::SonarAnalysisAge,
                MetricKind::ViolationSuppressions,
            ],
            Requirement::ViolationsBySeverity => &[
                MetricKind::BlockerViolations,
                MetricKind::CriticalViolations,
                MetricKind::MajorViolations,
            ],
            Requirement::ViolationsByType => &[
                MetricKind::MaintainabilityBugs,
                MetricKind::Vulnerabilities,
                MetricKind::CodeSmells,
            ],
            Requirement::UnitTests => &[MetricKind::FailingUnittests, MetricKind::UnittestReportAge],
            Requirement::UnitTestCoverage => &[
                MetricKind::UnittestLineCoverage,
                MetricKind::UnittestBranchCoverage,
            ],
            Requirement::Art => &[MetricKind::FailingRegressionTests, MetricKind::RegressionTestAge],
            Requirement::ArtCoverage => &[
                MetricKind::ArtStatementCoverage,
                MetricKind::ArtBranchCoverage,
                MetricKind::ArtCoverageReportAge,
            ],
            Requirement::OwaspDependencies => &[
                MetricKind::HighPriorityOwaspDependencyWarnings,
                MetricKind::NormalPriorityOwaspDependencyWarnings,
                MetricKind::OwaspDependencyReportAge,
            ],
            Requirement::OwaspZap => &[
                MetricKind::HighRiskZapScanAlerts,
                MetricKind::MediumRiskZapScanAlerts,
            ],
            Requirement::Checkmarx => &[
                MetricKind::HighRiskCheckmarxAlerts,
                MetricKind::MediumRiskCheckmarxAlerts,
                MetricKind::CheckmarxReportAge,
            ],
            Requirement::TrustedProductMaintainability => &[MetricKind::TotalLoc],
            Requirement::TrackBugs => &[MetricKind::OpenBugs],
            Requirement::TrackSecurityBugs => &[MetricKind::OpenSecurityBugs],
            Requirement::TrackTechnicalDebt => &[MetricKind::TechnicalDebtIssues],
            Requirement::TrackActions => &[
                MetricKind::ActionActivity,
                MetricKind::OverDueActions,
                MetricKind::StaleActions,
            ],
            Requirement::TrackRisks => &[MetricKind::RiskLog],
            Requirement::TrackReadyUs => &[MetricKind::ReadyUserStoryPoints],
            Requirement::TrackUserStoriesInProgress => &[MetricKind::UserStoriesInProgress],
            Requirement::TrackDurationOfUserStories => &[MetricKind::UserStoriesDuration],
            Requirement::TrackSecurityAndPerformanceRisks => &[
                MetricKind::UserStoriesWithoutSecurityRiskAssessment,
                MetricKind::UserStoriesWithoutPerformanceRiskAssessment,
            ],
            Requirement::TrackCiJobs => &[MetricKind::FailingCiJobs, MetricKind::UnusedCiJobs],
            Requirement::TrackSonarVersion => &[MetricKind::SonarVersion],
            Requirement::TrackSpirit => &[MetricKind::TeamSpirit, MetricKind::TeamSpiritAge],
            Requirement::TrackBranches => &[MetricKind::UnmergedBranches],
        }
    }

    /// The requirement that brings this metric, `None` for meta metrics.
    pub fn requirement(self) -> Option<Requirement> {
        Requirement::ALL
            .into_iter()
            .find(|requirement| Self::for_requirement(*requirement).contains(&self))
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

impl FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricKind::ALL
            .into_iter()
            .find(|kind| kind.class_name() == s)
            .ok_or_else(|| format!("unknown metric class: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn class_names_round_trip() {
        for kind in MetricKind::ALL {
            assert_eq!(kind.class_name().parse::<MetricKind>(), Ok(kind));
        }
        assert!("LinesOfCode".parse::<MetricKind>().is_err());
    }

    #[test]
    fn every_non_meta_metric_belongs_to_exactly_one_requirement() {
        let mut seen = BTreeSet::new();
        for requirement in Requirement::ALL {
            for kind in MetricKind::for_requirement(requirement) {
                assert!(seen.insert(*kind), "{kind} is listed twice");
            }
        }
        let non_meta: BTreeSet<MetricKind> =
            MetricKind::ALL.into_iter().filter(|kind| !kind.is_meta()).collect();
        assert_eq!(seen, non_meta);
        assert_eq!(MetricKind::GreenMetaMetric.requirement(), None);
        assert_eq!(
            MetricKind::StaleActions.requirement(),
            Some(Requirement::TrackActions)
        );
    }
}
