//! Static definitions of the metric classes: names, units, default norms and
//! the Dutch texts reported for them.

use std::collections::BTreeMap;
use std::fmt;

use hq_model::{MetricValue, SourceRole};

use crate::kind::MetricKind;
use crate::template::render;

const LOWER_IS_BETTER_NORM: &str = "Maximaal {target} {unit}. Meer dan {low_target} {unit} is rood.";
const HIGHER_IS_BETTER_NORM: &str = "Minimaal {target} {unit}. Minder dan {low_target} {unit} is rood.";
const DEFAULT_TEMPLATE: &str = "{name} heeft {value} {unit}.";

/// Report text when the source role has no configured source.
pub const MISSING_SOURCE_TEMPLATE: &str = "De {metric} van {name} kon niet gemeten worden omdat de bron \
     {metric_source_class} niet is geconfigureerd.";
/// Report text when the subject has no ids for any source of the role.
pub const MISSING_SOURCE_ID_TEMPLATE: &str = "De {metric} van {name} kon niet gemeten worden omdat niet alle \
     benodigde bron-ids zijn geconfigureerd. Configureer ids voor de bron {metric_source_class}.";
/// Report text when a configured source could not deliver the value.
pub const MISSING_TEMPLATE: &str = "De {metric} van {name} kon niet gemeten worden omdat niet alle benodigde \
     bronnen beschikbaar zijn.";

const METHOD_NORM: &str =
    "Maximaal {target}{unit} van de methoden heeft {attribute}. Meer dan {low_target}{unit} is rood.";
const METHOD_TEMPLATE: &str =
    "{value}{unit} van de methoden ({numerator} van {denominator}) van {name} heeft {attribute}.";
const VIOLATION_NORM: &str = "Maximaal {target} {violation_type} {unit}. \
     Meer dan {low_target} {violation_type} {unit} is rood.";
const VIOLATION_TEMPLATE: &str = "{name} heeft {value} {violation_type} {unit}.";
const REPORT_AGE_NORM: &str =
    "De leeftijd van het {report} is maximaal {target} {unit} oud. Meer dan {low_target} {unit} is rood.";
const REPORT_AGE_TEMPLATE: &str = "Het meest recente {report} van {name} is {value} {unit} oud.";
const OWASP_NORM: &str =
    "Dependencies van het product hebben geen {priority} prioriteit OWASP {unit}. Meer dan {low_target} is rood.";
const OWASP_TEMPLATE: &str = "Dependencies van {name} hebben {value} {priority} prioriteit {unit}.";
const ALERT_NORM: &str =
    "Het product heeft geen {risk_level} risico {scanner} {unit}. Meer dan {low_target} is rood.";
const ALERT_TEMPLATE: &str = "{name} heeft {value} {risk_level} risico {unit}.";
const ART_COVERAGE_NORM: &str = "Minimaal {target}{unit} van de {covered_items} wordt gedekt door \
     geautomatiseerde functionele tests. Minder dan {low_target}{unit} is rood.";
const ART_COVERAGE_TEMPLATE: &str = "{name} ART {covered_item} coverage is {value}{unit}.";
const ISSUE_COUNT_TEMPLATE: &str = "Het aantal {unit} is {value}.";
const META_TEMPLATE: &str = "{value}{unit} van de metrieken ({numerator} van de {denominator}) {verdict}.";

/// How values compare against targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    LowerIsBetter,
    HigherIsBetter,
    /// Smileys ordered ":-(", ":-|", ":-)".
    Smiley,
    /// Version numbers, higher is better.
    Version,
}

/// A default target as written in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultTarget {
    Number(i64),
    Text(&'static str),
}

impl DefaultTarget {
    pub fn to_value(self) -> MetricValue {
        match self {
            DefaultTarget::Number(number) => MetricValue::Integer(number),
            DefaultTarget::Text(text) => MetricValue::from(text),
        }
    }
}

impl fmt::Display for DefaultTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultTarget::Number(number) => write!(f, "{number}"),
            DefaultTarget::Text(text) => f.write_str(text),
        }
    }
}

/// Static description of a metric class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricDefinition {
    pub kind: MetricKind,
    pub name: &'static str,
    /// Unit in plural, e.g. "regels code".
    pub unit: &'static str,
    pub direction: Direction,
    pub target: DefaultTarget,
    pub low_target: DefaultTarget,
    pub perfect: Option<DefaultTarget>,
    pub norm_template: &'static str,
    pub template: &'static str,
    pub perfect_template: Option<&'static str>,
    /// Role of the source the metric reads, `None` for meta metrics.
    pub role: Option<SourceRole>,
    /// Whether the subject must configure ids for the source.
    pub needs_ids: bool,
    /// Fixed parameters of the norm and report templates.
    pub params: &'static [(&'static str, &'static str)],
}

impl MetricDefinition {
    const fn lower(kind: MetricKind, name: &'static str, unit: &'static str, target: i64, low_target: i64) -> Self {
        Self {
            kind,
            name,
            unit,
            direction: Direction::LowerIsBetter,
            target: DefaultTarget::Number(target),
            low_target: DefaultTarget::Number(low_target),
            perfect: Some(DefaultTarget::Number(0)),
            norm_template: LOWER_IS_BETTER_NORM,
            template: DEFAULT_TEMPLATE,
            perfect_template: None,
            role: None,
            needs_ids: true,
            params: &[],
        }
    }

    const fn higher(kind: MetricKind, name: &'static str, unit: &'static str, target: i64, low_target: i64) -> Self {
        let mut definition = Self::lower(kind, name, unit, target, low_target);
        definition.direction = Direction::HigherIsBetter;
        definition.perfect = None;
        definition.norm_template = HIGHER_IS_BETTER_NORM;
        definition
    }

    const fn norm(mut self, norm_template: &'static str) -> Self {
        self.norm_template = norm_template;
        self
    }

    const fn template(mut self, template: &'static str) -> Self {
        self.template = template;
        self
    }

    const fn perfect_template(mut self, template: &'static str) -> Self {
        self.perfect_template = Some(template);
        self
    }

    const fn perfect(mut self, perfect: DefaultTarget) -> Self {
        self.perfect = Some(perfect);
        self
    }

    const fn role(mut self, role: SourceRole) -> Self {
        self.role = Some(role);
        self
    }

    const fn without_ids(mut self) -> Self {
        self.needs_ids = false;
        self
    }

    const fn params(mut self, params: &'static [(&'static str, &'static str)]) -> Self {
        self.params = params;
        self
    }

    const fn text_targets(mut self, direction: Direction, target: &'static str, low_target: &'static str) -> Self {
        self.direction = direction;
        self.target = DefaultTarget::Text(target);
        self.low_target = DefaultTarget::Text(low_target);
        self
    }

    /// The norm with the default targets.
    pub fn default_norm(&self) -> String {
        let mut params: BTreeMap<&str, String> = self
            .params
            .iter()
            .map(|(key, value)| (*key, (*value).to_string()))
            .collect();
        params.insert("target", self.target.to_string());
        params.insert("low_target", self.low_target.to_string());
        params.insert("unit", self.unit.to_string());
        render(self.norm_template, &params)
    }
}

impl MetricKind {
    pub fn definition(self) -> &'static MetricDefinition {
        &CATALOG[self as usize]
    }
}

use DefaultTarget::{Number, Text};
use MetricDefinition as Def;
use MetricKind as K;
use SourceRole as R;

/// Indexed by `MetricKind as usize`.
static CATALOG: [MetricDefinition; 54] = [
    Def::lower(K::ProductLoc, "Component omvang", "regels code", 5000, 6000).role(R::Sonar),
    Def::lower(K::CommentedLoc, "Hoeveelheid uitgecommentarieerde broncode", "%", 1, 5)
        .norm(
            "Maximaal {target}{unit} van de regels code is uitgecommentarieerd. \
             Meer dan {low_target}{unit} is rood.",
        )
        .template("{name} heeft {value}{unit} ({numerator} van {denominator}) uitgecommentarieerde regels code.")
        .role(R::Sonar),
    Def::lower(K::CyclomaticComplexity, "Cyclomatische complexiteit", "%", 0, 5)
        .norm(METHOD_NORM)
        .template(METHOD_TEMPLATE)
        .params(&[("attribute", "een cyclomatische complexiteit van 10 of hoger")])
        .role(R::Sonar),
    Def::lower(K::LongMethods, "Lengte van methoden", "%", 0, 5)
        .norm(METHOD_NORM)
        .template(METHOD_TEMPLATE)
        .params(&[("attribute", "een lengte van meer dan 20 NCSS (Non-Comment Source Statements)")])
        .role(R::Sonar),
    Def::lower(K::ManyParameters, "Hoeveelheid methoden met te veel parameters", "%", 0, 5)
        .norm(METHOD_NORM)
        .template(METHOD_TEMPLATE)
        .params(&[("attribute", "meer dan 5 parameters")])
        .role(R::Sonar),
    Def::lower(K::SonarAnalysisAge, "Leeftijd van de meest recente Sonar analyse", "dagen", 42, 63)
        .norm(
            "De meest recente Sonar analyse is maximaal {target} {unit} oud. \
             Meer dan {low_target} {unit} is rood.",
        )
        .template("De meest recente Sonar analyse van {name} is {value} {unit} oud.")
        .role(R::Sonar),
    Def::lower(K::BlockerViolations, "Hoeveelheid blocker violations", "violations", 0, 0)
        .norm(VIOLATION_NORM)
        .template(VIOLATION_TEMPLATE)
        .params(&[("violation_type", "blocker")])
        .role(R::Sonar),
    Def::lower(K::CriticalViolations, "Hoeveelheid critical violations", "violations", 0, 1)
        .norm(VIOLATION_NORM)
        .template(VIOLATION_TEMPLATE)
        .params(&[("violation_type", "critical")])
        .role(R::Sonar),
    Def::lower(K::MajorViolations, "Hoeveelheid major violations", "violations", 25, 50)
        .norm(VIOLATION_NORM)
        .template(VIOLATION_TEMPLATE)
        .params(&[("violation_type", "major")])
        .role(R::Sonar),
    Def::lower(K::ViolationSuppressions, "Hoeveelheid onderdrukte violations", "onderdrukte violations", 25, 50)
        .role(R::Sonar),
    Def::lower(K::MaintainabilityBugs, "Hoeveelheid maintainability bugs", "maintainability bugs", 0, 3)
        .role(R::Sonar),
    Def::lower(K::Vulnerabilities, "Hoeveelheid vulnerabilities", "vulnerabilities", 0, 3).role(R::Sonar),
    Def::lower(K::CodeSmells, "Hoeveelheid code smells", "code smells", 25, 50).role(R::Sonar),
    Def::higher(K::UnittestLineCoverage, "Unit test broncode dekking (line coverage)", "%", 98, 90)
        .norm(
            "Minimaal {target}{unit} van de regels code wordt gedekt door unittests. \
             Lager dan {low_target}{unit} is rood.",
        )
        .template("{name} unittest line coverage is {value}{unit} ({tests} unittests).")
        .perfect(Number(100))
        .role(R::Sonar),
    Def::higher(K::UnittestBranchCoverage, "Unit test broncode dekking (branch coverage)", "%", 80, 60)
        .norm(
            "Minimaal {target}{unit} van de code branches wordt gedekt door unittests. \
             Lager dan {low_target}{unit} is rood.",
        )
        .template("{name} unittest branch coverage is {value}{unit} ({tests} unittests).")
        .perfect(Number(100))
        .role(R::Sonar),
    Def::lower(K::FailingUnittests, "Hoeveelheid falende unittesten", "unittesten", 0, 0)
        .norm("Alle unittesten slagen.")
        .template("{value} van de {tests} {unit} falen.")
        .perfect_template("{tests} van de {tests} {unit} slagen.")
        .role(R::UnitTestReport),
    Def::lower(K::UnittestReportAge, "Leeftijd van het unittest rapport", "dagen", 3, 7)
        .norm(REPORT_AGE_NORM)
        .template(REPORT_AGE_TEMPLATE)
        .params(&[("report", "unittest rapport")])
        .role(R::UnitTestReport),
    Def::lower(K::FailingRegressionTests, "Hoeveelheid falende regressietesten", "regressietesten", 0, 0)
        .norm("Alle {unit} slagen.")
        .template(
            "Van de {tests} {name} {unit} zijn er {value} niet geslaagd \
             (waarvan {failed} gefaald en {skipped} overgeslagen).",
        )
        .perfect_template("Alle {tests} {unit} van {name} slagen en geen van de {unit} is overgeslagen.")
        .role(R::SystemTestReport),
    Def::lower(K::RegressionTestAge, "Regressietestleeftijd", "dagen", 3, 7)
        .norm(
            "De regressietest is maximaal {target} {unit} geleden gedraaid. \
             Langer dan {low_target} {unit} geleden is rood.",
        )
        .template("De regressietest van {name} is {value} {unit} geleden gedraaid.")
        .perfect_template("De regressietest van {name} is vandaag gedraaid.")
        .role(R::SystemTestReport),
    Def::higher(K::ArtStatementCoverage, "Automatic regression test statement coverage", "%", 80, 70)
        .norm(ART_COVERAGE_NORM)
        .template(ART_COVERAGE_TEMPLATE)
        .params(&[("covered_item", "statement"), ("covered_items", "statements")])
        .perfect(Number(100))
        .role(R::CoverageReport),
    Def::higher(K::ArtBranchCoverage, "Automatic regression test branch coverage", "%", 75, 60)
        .norm(ART_COVERAGE_NORM)
        .template(ART_COVERAGE_TEMPLATE)
        .params(&[("covered_item", "branch"), ("covered_items", "branches")])
        .perfect(Number(100))
        .role(R::CoverageReport),
    Def::lower(K::ArtCoverageReportAge, "Coveragerapportageleeftijd", "dagen", 3, 7)
        .norm(
            "De coveragerapportage is maximaal {target} {unit} geleden gemaakt. \
             Langer dan {low_target} {unit} geleden is rood.",
        )
        .template("De coveragerapportage van {name} is {value} {unit} geleden gemaakt.")
        .perfect_template("De coveragerapportage van {name} is vandaag gemaakt.")
        .role(R::CoverageReport),
    Def::lower(K::UnmergedBranches, "Hoeveelheid ongemergde branches", "branches", 0, 1)
        .norm("Maximaal {target} {unit} met ongemergde code. Meer dan {low_target} {unit} is rood.")
        .template("{value} van de {nr_branches} {unit} van {name} hebben revisies die niet zijn gemerged.")
        .perfect_template("Geen van de {nr_branches} {unit} van {name} heeft revisies die niet zijn gemerged.")
        .role(R::VersionControlSystem),
    Def::lower(
        K::HighPriorityOwaspDependencyWarnings,
        "Hoeveelheid OWASP dependency waarschuwingen met hoge prioriteit",
        "waarschuwingen",
        0,
        0,
    )
    .norm(OWASP_NORM)
    .template(OWASP_TEMPLATE)
    .params(&[("priority", "hoge")])
    .role(R::OwaspDependencyReport),
    Def::lower(
        K::NormalPriorityOwaspDependencyWarnings,
        "Hoeveelheid OWASP dependency waarschuwingen met normale prioriteit",
        "waarschuwingen",
        0,
        3,
    )
    .norm(OWASP_NORM)
    .template(OWASP_TEMPLATE)
    .params(&[("priority", "normale")])
    .role(R::OwaspDependencyReport),
    Def::lower(K::OwaspDependencyReportAge, "Leeftijd van het OWASP dependency rapport", "dagen", 3, 7)
        .norm(REPORT_AGE_NORM)
        .template(REPORT_AGE_TEMPLATE)
        .params(&[("report", "OWASP dependency rapport")])
        .role(R::OwaspDependencyReport),
    Def::lower(
        K::HighRiskZapScanAlerts,
        "Hoeveelheid ZAP Scan waarschuwingen met hoog risiconiveau",
        "waarschuwingen",
        0,
        0,
    )
    .norm(ALERT_NORM)
    .template(ALERT_TEMPLATE)
    .params(&[("risk_level", "hoog"), ("scanner", "ZAP Scan")])
    .role(R::ZapScanReport),
    Def::lower(
        K::MediumRiskZapScanAlerts,
        "Hoeveelheid ZAP Scan waarschuwingen met medium risiconiveau",
        "waarschuwingen",
        0,
        5,
    )
    .norm(ALERT_NORM)
    .template(ALERT_TEMPLATE)
    .params(&[("risk_level", "medium"), ("scanner", "ZAP Scan")])
    .role(R::ZapScanReport),
    Def::lower(
        K::HighRiskCheckmarxAlerts,
        "Hoeveelheid Checkmarx waarschuwingen met hoog risiconiveau",
        "waarschuwingen",
        0,
        0,
    )
    .norm(ALERT_NORM)
    .template(ALERT_TEMPLATE)
    .params(&[("risk_level", "hoog"), ("scanner", "Checkmarx")])
    .role(R::Checkmarx),
    Def::lower(
        K::MediumRiskCheckmarxAlerts,
        "Hoeveelheid Checkmarx waarschuwingen met medium risiconiveau",
        "waarschuwingen",
        0,
        5,
    )
    .norm(ALERT_NORM)
    .template(ALERT_TEMPLATE)
    .params(&[("risk_level", "medium"), ("scanner", "Checkmarx")])
    .role(R::Checkmarx),
    Def::lower(K::CheckmarxReportAge, "Leeftijd van het Checkmarx rapport", "dagen", 3, 7)
        .norm(REPORT_AGE_NORM)
        .template(REPORT_AGE_TEMPLATE)
        .params(&[("report", "Checkmarx rapport")])
        .role(R::Checkmarx),
    Def::lower(K::TotalLoc, "Totale omvang", "regels code", 30000, 30500)
        .template("Het totaal aantal {unit} voor de producten {products} is {value} {unit}.")
        .role(R::Sonar)
        .without_ids(),
    Def::lower(K::OpenBugs, "Hoeveelheid open bugreports", "open bugreports", 50, 100)
        .norm("Het aantal {unit} is minder dan {target}. Meer dan {low_target} {unit} is rood.")
        .template(ISSUE_COUNT_TEMPLATE)
        .role(R::BugTracker),
    Def::lower(K::OpenSecurityBugs, "Hoeveelheid open beveiligingsbugreports", "beveiligingsbugreports", 0, 3)
        .norm(
            "Het aantal {unit} met prioriteit major of hoger dat meer dan een sprint open staat \
             is minder dan {target}. Meer dan {low_target} {unit} is rood.",
        )
        .template(ISSUE_COUNT_TEMPLATE)
        .role(R::SecurityBugTracker),
    Def::lower(K::TechnicalDebtIssues, "Hoeveelheid technische schuld issues", "technische schuld issues", 10, 50)
        .norm("Het aantal {unit} is maximaal {target}. Meer dan {low_target} {unit} is rood.")
        .template(ISSUE_COUNT_TEMPLATE)
        .role(R::TechnicalDebtTracker),
    Def::higher(K::ReadyUserStoryPoints, "Hoeveelheid ready user story punten", "ready user story punten", 30, 15)
        .role(R::ReadyUserStoryPointsTracker),
    Def::lower(K::UserStoriesInProgress, "Hoeveelheid user stories in progress", "stories in progress", 3, 5)
        .role(R::UserStoriesInProgressTracker),
    Def::lower(K::UserStoriesDuration, "Gemiddelde looptijd van user stories", "dagen gemiddeld in progress", 5, 10)
        .norm("User stories zijn maximaal {target} {unit}. Meer dan {low_target} {unit} is rood.")
        .template("{total} user stories waren {value} {unit}.")
        .role(R::UserStoriesDurationTracker),
    Def::lower(
        K::UserStoriesWithoutSecurityRiskAssessment,
        "Hoeveelheid user stories zonder security risk beoordeling",
        "ready user stories zonder security risk beoordeling",
        1,
        3,
    )
    .template(ISSUE_COUNT_TEMPLATE)
    .role(R::UserStoryWithoutSecurityRiskAssessmentTracker),
    Def::lower(
        K::UserStoriesWithoutPerformanceRiskAssessment,
        "Hoeveelheid user stories zonder performance risk beoordeling",
        "ready user stories zonder performance risk beoordeling",
        1,
        3,
    )
    .template(ISSUE_COUNT_TEMPLATE)
    .role(R::UserStoryWithoutPerformanceRiskAssessmentTracker),
    Def::lower(K::ActionActivity, "Actualiteit van de actielijst", "dagen", 7, 14)
        .norm(
            "De actie- en besluitenlijst wordt minimaal een keer per {target} {unit} bijgewerkt. \
             Meer dan {low_target} {unit} niet bijgewerkt is rood.",
        )
        .template("De actie- en besluitenlijst is {value} {unit} geleden voor het laatst bijgewerkt.")
        .role(R::ActionLog),
    Def::lower(K::OverDueActions, "Tijdigheid van de acties", "acties", 0, 3)
        .norm(
            "Geen van de acties en besluiten in de actie- en besluitenlijst is te laat. \
             Meer dan {low_target} {unit} te laat is rood.",
        )
        .template("{value} {unit} uit de actie- en besluitenlijst zijn te laat.")
        .role(R::ActionLog),
    Def::lower(K::StaleActions, "Actualiteit van de acties", "acties", 0, 3)
        .norm(
            "Geen van de acties en besluiten in de actie- en besluitenlijst is te lang (14 dagen) \
             niet bijgewerkt. Meer dan {low_target} {unit} te lang niet bijgewerkt is rood.",
        )
        .template("{value} {unit} uit de actie- en besluitenlijst zijn te lang (14 dagen) niet bijgewerkt.")
        .role(R::ActionLog),
    Def::lower(K::RiskLog, "Actualiteit van de risico log", "dagen", 14, 28)
        .norm(
            "Het risicolog wordt minimaal een keer per {target} {unit} bijgewerkt. \
             Meer dan {low_target} {unit} niet bijgewerkt is rood.",
        )
        .template("Het risicolog is {value} {unit} geleden voor het laatst bijgewerkt.")
        .role(R::RiskLog),
    Def::lower(K::FailingCiJobs, "Hoeveelheid falende CI-jobs", "CI-jobs", 0, 2)
        .norm(
            "Maximaal {target} van de actieve {unit} faalt. Meer dan {low_target} {unit} is rood. \
             Een CI-job faalt als de laatste bouwpoging niet geslaagd is en er de afgelopen 24 uur \
             geen geslaagde bouwpogingen zijn geweest.",
        )
        .template("{value} van de {number_of_jobs} actieve {unit} faalt.")
        .role(R::CiServer)
        .without_ids(),
    Def::lower(K::UnusedCiJobs, "Hoeveelheid ongebruikte CI-jobs", "CI-jobs", 0, 2)
        .norm(
            "Maximaal {target} van de {unit} is ongebruikt. Meer dan {low_target} {unit} is rood. \
             Een CI-job is ongebruikt als er de afgelopen 180 dagen geen bouwpogingen zijn geweest.",
        )
        .template("{value} van de {number_of_jobs} {unit} is ongebruikt.")
        .role(R::CiServer)
        .without_ids(),
    Def::lower(K::SonarVersion, "Versie van Sonar", "", 0, 0)
        .text_targets(Direction::Version, "6.7.0", "5.6.4")
        .perfect(Text("999.999.999"))
        .norm("Sonar heeft minimaal versie {target}, lager dan versie {low_target} is rood.")
        .template("Sonar is versie {value}.")
        .role(R::Sonar)
        .without_ids(),
    Def::lower(K::TeamSpirit, "Teamstemming", "", 0, 0)
        .text_targets(Direction::Smiley, ":-)", ":-(")
        .perfect(Text(":-)"))
        .norm(
            "De stemming wordt door het team zelf bepaald door het kiezen van een smiley. \
             De norm hierbij is een tevreden team, neutraal is geel, ontevreden is rood.",
        )
        .template("De stemming van team {name} is {value}.")
        .role(R::TeamSpirit),
    Def::lower(K::TeamSpiritAge, "Teamstemmingleeftijd", "dagen", 21, 42)
        .norm(
            "De teamstemming is maximaal {target} {unit} geleden bepaald. \
             Langer dan {low_target} {unit} geleden is rood.",
        )
        .template("De stemming van team {name} is {value} {unit} geleden bepaald.")
        .role(R::TeamSpirit),
    Def::higher(K::GreenMetaMetric, "Percentage groene metrieken", "%", 90, 80)
        .norm(
            "Minimaal {target}{unit} van de metrieken scoort groen (op of boven de norm). \
             Minder dan {low_target}{unit} is rood.",
        )
        .template(META_TEMPLATE)
        .params(&[("verdict", "scoort boven de norm")])
        .perfect(Number(100)),
    Def::lower(K::RedMetaMetric, "Percentage rode metrieken", "%", 2, 5)
        .norm(
            "Maximaal {target}{unit} van de metrieken scoort rood (direct actie vereist). \
             Meer dan {low_target}{unit} is rood.",
        )
        .template(META_TEMPLATE)
        .params(&[("verdict", "scoort rood")]),
    Def::lower(K::YellowMetaMetric, "Percentage gele metrieken", "%", 5, 10)
        .norm(
            "Maximaal {target}{unit} van de metrieken scoort geel (onder de norm maar niet direct \
             actie vereist). Meer dan {low_target}{unit} is rood.",
        )
        .template(META_TEMPLATE)
        .params(&[("verdict", "scoort geel")]),
    Def::lower(K::GreyMetaMetric, "Percentage grijze metrieken", "%", 2, 5)
        .norm(
            "Maximaal {target}{unit} van de metrieken scoort grijs (geaccepteerde technische schuld). \
             Meer dan {low_target}{unit} is rood.",
        )
        .template(META_TEMPLATE)
        .params(&[("verdict", "scoort grijs")]),
    Def::lower(K::MissingMetaMetric, "Percentage niet meetbare metrieken", "%", 0, 5)
        .norm("Maximaal {target}{unit} van de metrieken kan niet gemeten worden. Meer dan {low_target}{unit} is rood.")
        .template(META_TEMPLATE)
        .params(&[("verdict", "kan niet gemeten worden")]),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_indexed_by_kind() {
        for kind in MetricKind::ALL {
            assert_eq!(kind.definition().kind, kind);
        }
    }

    #[test]
    fn only_meta_metrics_lack_a_source_role() {
        for kind in MetricKind::ALL {
            assert_eq!(kind.definition().role.is_none(), kind.is_meta(), "{kind}");
        }
    }

    #[test]
    fn default_norms() {
        assert_eq!(
            MetricKind::ProductLoc.definition().default_norm(),
            "Maximaal 5000 regels code. Meer dan 6000 regels code is rood."
        );
        assert_eq!(
            MetricKind::LongMethods.definition().default_norm(),
            "Maximaal 0% van de methoden heeft een lengte van meer dan 20 NCSS \
             (Non-Comment Source Statements). Meer dan 5% is rood."
        );
        assert_eq!(
            MetricKind::SonarVersion.definition().default_norm(),
            "Sonar heeft minimaal versie 6.7.0, lager dan versie 5.6.4 is rood."
        );
        assert_eq!(
            MetricKind::HighRiskZapScanAlerts.definition().default_norm(),
            "Het product heeft geen hoog risico ZAP Scan waarschuwingen. Meer dan 0 is rood."
        );
        assert_eq!(
            MetricKind::ArtBranchCoverage.definition().default_norm(),
            "Minimaal 75% van de branches wordt gedekt door geautomatiseerde functionele tests. \
             Minder dan 60% is rood."
        );
    }
}
