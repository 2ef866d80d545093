//! Reading metric values from their sources.
//!
//! Each metric class asks its source one or two questions and turns the
//! answers into a value, template parameters and an optional detail table.
//! Source errors propagate so the caller can report the metric as missing.

use chrono::NaiveDateTime;
use hq_model::format::{count_working_days, format_date, format_timedelta, percentage};
use hq_model::{MetricValue, Subject};
use hq_sources::checkmarx::{Checkmarx, Severity};
use hq_sources::git::{BranchFilter, Git, branch_url};
use hq_sources::happiness::Happiness;
use hq_sources::jira::Jira;
use hq_sources::owasp::{OwaspDependencyReport, Priority};
use hq_sources::sonar::{SEVERITIES, Sonar, VIOLATION_TYPES};
use hq_sources::trello::{INACTIVE_DAYS, Trello};
use hq_sources::zap::ZapScanReport;
use hq_sources::{CiServer, CoverageReport, JobInfo, Result, Source, SourceError, TestReport};
use tracing::warn;

use crate::context::MetricContext;
use crate::extra_info::{Cell, ExtraInfo};
use crate::kind::MetricKind;

const NO_UNITTESTS_TEMPLATE: &str = "Er zijn geen unittesten.";
const SKIPPED_UNITTESTS_TEMPLATE: &str =
    "{value} van de {tests} {unit} falen. {skipped} van de {tests} {unit} zijn overgeslagen.";

const NUMBER_HEADER: (&str, &str) = ("number", "Aantal__detail-column-number");
const DEBT_HEADER: (&str, &str) = ("debt", "Geschatte oplostijd__detail-column-number");

/// A resolved source with the subject's ids for it.
pub(crate) struct Input<'a> {
    pub kind: MetricKind,
    pub subject: &'a Subject,
    pub source_id: &'a str,
    pub source: &'a Source,
    pub ids: Vec<&'a str>,
    pub context: &'a MetricContext<'a>,
}

/// What a metric read from its source.
#[derive(Debug, Default)]
pub(crate) struct Outcome {
    pub value: Option<MetricValue>,
    pub params: Vec<(&'static str, String)>,
    pub extra_info: Option<ExtraInfo>,
    /// Replaces the catalog template.
    pub template: Option<&'static str>,
    pub force_red: bool,
}

impl Outcome {
    fn of(value: impl Into<MetricValue>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    fn param(mut self, key: &'static str, value: impl ToString) -> Self {
        self.params.push((key, value.to_string()));
        self
    }

    fn with_extra_info(mut self, extra_info: ExtraInfo) -> Self {
        if !extra_info.is_empty() {
            self.extra_info = Some(extra_info);
        }
        self
    }
}

fn count(number: usize) -> MetricValue {
    MetricValue::Integer(i64::try_from(number).unwrap_or(i64::MAX))
}

fn age(datetime: NaiveDateTime, now: NaiveDateTime) -> Outcome {
    Outcome::of((now - datetime).num_days())
}

fn unsupported(source: &Source, kind: MetricKind) -> SourceError {
    SourceError::Parse(format!("{} cannot measure {kind}", source.kind()))
}

impl<'a> Input<'a> {
    fn first_id(&self) -> Result<&'a str> {
        self.ids.first().copied().ok_or(SourceError::NoIds)
    }

    fn now(&self) -> NaiveDateTime {
        self.context.now
    }

    fn sonar(&self) -> Result<&'a Sonar> {
        self.source
            .as_sonar()
            .ok_or_else(|| unsupported(self.source, self.kind))
    }

    fn test_report(&self) -> Result<&'a dyn TestReport> {
        self.source
            .as_test_report()
            .ok_or_else(|| unsupported(self.source, self.kind))
    }

    fn coverage_report(&self) -> Result<&'a dyn CoverageReport> {
        self.source
            .as_coverage_report()
            .ok_or_else(|| unsupported(self.source, self.kind))
    }

    fn git(&self) -> Result<&'a Git> {
        self.source
            .as_git()
            .ok_or_else(|| unsupported(self.source, self.kind))
    }

    fn ci_server(&self) -> Result<&'a dyn CiServer> {
        self.source
            .as_ci_server()
            .ok_or_else(|| unsupported(self.source, self.kind))
    }

    fn jira(&self) -> Result<&'a Jira> {
        self.source
            .as_jira()
            .ok_or_else(|| unsupported(self.source, self.kind))
    }

    fn trello(&self) -> Result<&'a Trello> {
        self.source
            .as_trello()
            .ok_or_else(|| unsupported(self.source, self.kind))
    }

    fn owasp(&self) -> Result<&'a OwaspDependencyReport> {
        self.source
            .as_owasp()
            .ok_or_else(|| unsupported(self.source, self.kind))
    }

    fn zap(&self) -> Result<&'a ZapScanReport> {
        self.source
            .as_zap()
            .ok_or_else(|| unsupported(self.source, self.kind))
    }

    fn checkmarx(&self) -> Result<&'a Checkmarx> {
        self.source
            .as_checkmarx()
            .ok_or_else(|| unsupported(self.source, self.kind))
    }

    fn happiness(&self) -> Result<&'a Happiness> {
        self.source
            .as_happiness()
            .ok_or_else(|| unsupported(self.source, self.kind))
    }

    /// Urls a reader can follow for this metric.
    pub fn urls(&self) -> Vec<String> {
        let product = self.ids.first().copied();
        match (self.kind, self.source.as_sonar(), product) {
            (
                MetricKind::CyclomaticComplexity
                | MetricKind::LongMethods
                | MetricKind::ManyParameters
                | MetricKind::BlockerViolations
                | MetricKind::CriticalViolations
                | MetricKind::MajorViolations
                | MetricKind::ViolationSuppressions,
                Some(sonar),
                Some(product),
            ) => vec![sonar.violations_url(product)],
            (MetricKind::MaintainabilityBugs, Some(sonar), Some(product)) => {
                vec![sonar.violations_type_url(product, "BUG")]
            }
            (MetricKind::Vulnerabilities, Some(sonar), Some(product)) => {
                vec![sonar.violations_type_url(product, "VULNERABILITY")]
            }
            (MetricKind::CodeSmells, Some(sonar), Some(product)) => {
                vec![sonar.violations_type_url(product, "CODE_SMELL")]
            }
            (MetricKind::TotalLoc | MetricKind::SonarVersion, _, _) => {
                vec![self.source.as_metric_source().url().to_string()]
            }
            _ => self.source.as_metric_source().metric_source_urls(&self.ids),
        }
    }
}

/// Reads the value of the metric.
pub(crate) fn measure(input: &Input<'_>) -> Result<Outcome> {
    match input.kind {
        MetricKind::ProductLoc => {
            let sonar = input.sonar()?;
            Ok(Outcome::of(sonar.ncloc(input.first_id()?)?))
        }
        MetricKind::CommentedLoc => {
            let sonar = input.sonar()?;
            let product = input.first_id()?;
            Ok(percentage_outcome(
                sonar.commented_loc(product)?,
                sonar.ncloc(product)?,
                true,
            ))
        }
        MetricKind::CyclomaticComplexity => method_quality(input, Sonar::complex_methods),
        MetricKind::LongMethods => method_quality(input, Sonar::long_methods),
        MetricKind::ManyParameters => method_quality(input, Sonar::many_parameters_methods),
        MetricKind::SonarAnalysisAge => {
            let sonar = input.sonar()?;
            Ok(age(sonar.analysis_datetime(input.first_id()?)?, input.now()))
        }
        MetricKind::BlockerViolations => violations(input, "Blocker", Sonar::blocker_violations),
        MetricKind::CriticalViolations => violations(input, "Critical", Sonar::critical_violations),
        MetricKind::MajorViolations => violations(input, "Major", Sonar::major_violations),
        MetricKind::ViolationSuppressions => suppressions(input),
        MetricKind::MaintainabilityBugs => issues_by_severity(
            input,
            "BUG",
            Sonar::maintainability_bugs,
            "Maintainability bugs per severity",
        ),
        MetricKind::Vulnerabilities => issues_by_severity(
            input,
            "VULNERABILITY",
            Sonar::vulnerabilities,
            "Vulnerabilities per severity",
        ),
        MetricKind::CodeSmells => issues_by_severity(
            input,
            "CODE_SMELL",
            Sonar::code_smells,
            "Code smells per severity",
        ),
        MetricKind::UnittestLineCoverage => coverage(input, Sonar::unittest_line_coverage),
        MetricKind::UnittestBranchCoverage => coverage(input, Sonar::unittest_branch_coverage),
        MetricKind::FailingUnittests => failing_unittests(input),
        MetricKind::UnittestReportAge | MetricKind::RegressionTestAge => {
            let report = input.test_report()?;
            Ok(age(report.oldest_report_datetime(&input.ids)?, input.now()))
        }
        MetricKind::FailingRegressionTests => {
            let counts = input.test_report()?.total_test_counts(&input.ids)?;
            Ok(Outcome::of(counts.failed + counts.skipped)
                .param("tests", counts.total())
                .param("failed", counts.failed)
                .param("skipped", counts.skipped))
        }
        MetricKind::ArtStatementCoverage => {
            let report = input.coverage_report()?;
            Ok(Outcome::of(report.statement_coverage(input.first_id()?)?.round() as i64))
        }
        MetricKind::ArtBranchCoverage => {
            let report = input.coverage_report()?;
            Ok(Outcome::of(report.branch_coverage(input.first_id()?)?.round() as i64))
        }
        MetricKind::ArtCoverageReportAge => {
            let report = input.coverage_report()?;
            Ok(age(report.coverage_datetime(input.first_id()?)?, input.now()))
        }
        MetricKind::UnmergedBranches => unmerged_branches(input),
        MetricKind::HighPriorityOwaspDependencyWarnings => owasp_warnings(input, Priority::High),
        MetricKind::NormalPriorityOwaspDependencyWarnings => owasp_warnings(input, Priority::Normal),
        MetricKind::OwaspDependencyReportAge => {
            Ok(age(input.owasp()?.datetime(&input.ids)?, input.now()))
        }
        MetricKind::HighRiskZapScanAlerts => Ok(Outcome::of(count(input.zap()?.alerts(&input.ids, "high")?))),
        MetricKind::MediumRiskZapScanAlerts => {
            Ok(Outcome::of(count(input.zap()?.alerts(&input.ids, "medium")?)))
        }
        MetricKind::HighRiskCheckmarxAlerts => {
            Ok(Outcome::of(input.checkmarx()?.nr_warnings(&input.ids, Severity::High)?))
        }
        MetricKind::MediumRiskCheckmarxAlerts => {
            Ok(Outcome::of(input.checkmarx()?.nr_warnings(&input.ids, Severity::Medium)?))
        }
        MetricKind::CheckmarxReportAge => {
            Ok(age(input.checkmarx()?.datetime(&input.ids)?, input.now()))
        }
        MetricKind::TotalLoc => total_loc(input),
        MetricKind::OpenBugs
        | MetricKind::OpenSecurityBugs
        | MetricKind::TechnicalDebtIssues
        | MetricKind::UserStoriesInProgress
        | MetricKind::UserStoriesWithoutSecurityRiskAssessment
        | MetricKind::UserStoriesWithoutPerformanceRiskAssessment => issue_count(input),
        MetricKind::ReadyUserStoryPoints => story_points(input),
        MetricKind::UserStoriesDuration => story_duration(input),
        MetricKind::ActionActivity | MetricKind::RiskLog => {
            Ok(age(input.trello()?.last_activity(&input.ids)?, input.now()))
        }
        MetricKind::OverDueActions => {
            let cards = input.trello()?.over_due_cards(&input.ids, input.now())?;
            Ok(action_cards(cards, "Te late acties", "Te laat"))
        }
        MetricKind::StaleActions => {
            let cards = input
                .trello()?
                .inactive_cards(&input.ids, input.now(), INACTIVE_DAYS)?;
            Ok(action_cards(cards, "Niet bijgewerkte acties", "Niet bijgewerkt"))
        }
        MetricKind::FailingCiJobs => {
            let server = input.ci_server()?;
            let jobs = server.failing_jobs(&input.ids, input.now())?;
            ci_jobs(server, &input.ids, jobs, "Falende jobs")
        }
        MetricKind::UnusedCiJobs => {
            let server = input.ci_server()?;
            let jobs = server.unused_jobs(&input.ids, input.now())?;
            ci_jobs(server, &input.ids, jobs, "Ongebruikte jobs")
        }
        MetricKind::SonarVersion => input
            .sonar()?
            .version_number()
            .map(Outcome::of)
            .ok_or_else(|| SourceError::Parse("Sonar version unknown".to_string())),
        MetricKind::TeamSpirit => Ok(Outcome::of(input.happiness()?.team_spirit(input.first_id()?)?)),
        MetricKind::TeamSpiritAge => {
            Ok(age(input.happiness()?.datetime(input.first_id()?)?, input.now()))
        }
        MetricKind::GreenMetaMetric
        | MetricKind::RedMetaMetric
        | MetricKind::YellowMetaMetric
        | MetricKind::GreyMetaMetric
        | MetricKind::MissingMetaMetric => Err(unsupported(input.source, input.kind)),
    }
}

fn percentage_outcome(numerator: i64, denominator: i64, zero_divided_by_zero_is_zero: bool) -> Outcome {
    Outcome::of(percentage(
        numerator as f64,
        denominator as f64,
        zero_divided_by_zero_is_zero,
    ))
    .param("numerator", numerator)
    .param("denominator", denominator)
}

fn method_quality(input: &Input<'_>, violating: fn(&Sonar, &str) -> Result<i64>) -> Result<Outcome> {
    let sonar = input.sonar()?;
    let product = input.first_id()?;
    Ok(percentage_outcome(violating(sonar, product)?, sonar.methods(product)?, true))
}

fn violations(
    input: &Input<'_>,
    severity: &str,
    violation_count: fn(&Sonar, &str) -> Result<i64>,
) -> Result<Outcome> {
    let sonar = input.sonar()?;
    let product = input.first_id()?;
    let value = violation_count(sonar, product)?;
    let mut info = ExtraInfo::new(
        format!("{severity} violations per soort"),
        &[("violation_type", "Violation type"), NUMBER_HEADER, DEBT_HEADER],
    );
    if value > 0 {
        for (issue_type, label) in VIOLATION_TYPES {
            match sonar.violations_type_severity(product, issue_type, severity) {
                Ok(summary) if summary.count > 0 => info.push(vec![
                    Cell::link(summary.url, label),
                    Cell::from(summary.count),
                    Cell::from(summary.effort),
                ]),
                Ok(_) => {}
                Err(err) => warn!(%product, issue_type, severity, error = %err, "Violation details unavailable"),
            }
        }
    }
    Ok(Outcome::of(value).with_extra_info(info))
}

fn issues_by_severity(
    input: &Input<'_>,
    issue_type: &str,
    issue_count: fn(&Sonar, &str) -> Result<i64>,
    title: &str,
) -> Result<Outcome> {
    let sonar = input.sonar()?;
    let product = input.first_id()?;
    let value = issue_count(sonar, product)?;
    let mut info = ExtraInfo::new(title, &[("severity", "Severity"), NUMBER_HEADER, DEBT_HEADER]);
    if value > 0 {
        for severity in SEVERITIES {
            match sonar.violations_type_severity(product, issue_type, severity) {
                Ok(summary) if summary.count > 0 => info.push(vec![
                    Cell::link(summary.url, severity),
                    Cell::from(summary.count),
                    Cell::from(summary.effort),
                ]),
                Ok(_) => {}
                Err(err) => warn!(%product, issue_type, severity, error = %err, "Issue details unavailable"),
            }
        }
    }
    Ok(Outcome::of(value).with_extra_info(info))
}

fn suppressions(input: &Input<'_>) -> Result<Outcome> {
    let sonar = input.sonar()?;
    let product = input.first_id()?;
    let false_positives = sonar.false_positives(product)?;
    let wont_fix = sonar.wont_fix(product)?;
    let suppressed = sonar.suppressions(product)?;
    let mut info = ExtraInfo::new(
        "Onderdrukte violations",
        &[("suppression_type", "Wijze van onderdrukking"), NUMBER_HEADER],
    );
    for (url, label, number) in [
        (
            sonar.false_positives_url(product),
            "Gemarkeerd als false positive in SonarQube",
            false_positives,
        ),
        (
            sonar.wont_fix_url(product),
            "Gemarkeerd als won't fix in SonarQube",
            wont_fix,
        ),
        (
            sonar.suppressions_url(product),
            "Gemarkeerd in de broncode met annotatie, commentaar (bijv. //NOSONAR) of pragma",
            suppressed,
        ),
    ] {
        info.push(vec![Cell::link(url, label), Cell::from(number)]);
    }
    Ok(Outcome::of(false_positives + wont_fix + suppressed).with_extra_info(info))
}

fn coverage(input: &Input<'_>, measured: fn(&Sonar, &str) -> Result<f64>) -> Result<Outcome> {
    let sonar = input.sonar()?;
    let product = input.first_id()?;
    let value = measured(sonar, product)?.round() as i64;
    let tests = sonar
        .unittests(product)
        .map_or_else(|_| "?".to_string(), |tests| tests.to_string());
    Ok(Outcome::of(value).param("tests", tests))
}

fn failing_unittests(input: &Input<'_>) -> Result<Outcome> {
    let counts = input.test_report()?.total_test_counts(&input.ids)?;
    let total = counts.total();
    let mut outcome = Outcome::of(counts.failed)
        .param("tests", total)
        .param("skipped", counts.skipped);
    if total == 0 {
        outcome.template = Some(NO_UNITTESTS_TEMPLATE);
        outcome.force_red = true;
    } else if counts.skipped > 0 {
        outcome.template = Some(SKIPPED_UNITTESTS_TEMPLATE);
    }
    Ok(outcome)
}

fn branch_filter(input: &Input<'_>) -> Result<BranchFilter> {
    match input.subject.metric_options(input.kind.class_name()) {
        Some(options) => BranchFilter::new(
            options.branches_to_ignore.clone(),
            options.branches_to_ignore_re.as_deref(),
            options.branches_to_include.clone(),
        ),
        None => Ok(BranchFilter::default()),
    }
}

fn unmerged_branches(input: &Input<'_>) -> Result<Outcome> {
    let git = input.git()?;
    let repository = input.first_id()?;
    let branches = git.unmerged_branches(&branch_filter(input)?)?;
    let nr_branches = git.branches(false).map_or_else(
        |err| {
            warn!(%repository, error = %err, "Number of branches unknown");
            "onbekend aantal".to_string()
        },
        |all| all.len().to_string(),
    );
    let mut info = ExtraInfo::new(
        "Niet gemergde branches",
        &[
            ("link", "Branch"),
            ("comment", "Aantal ongemergde revisies__detail-column-number"),
            ("date_last_change", "Datum laatste wijziging__detail-column-number"),
        ],
    );
    for branch in &branches {
        let last_change = branch.last_change.map_or_else(
            || "onbekend".to_string(),
            |moment| moment.format("%d-%m-%Y").to_string(),
        );
        info.push(vec![
            Cell::link(branch_url(repository, &branch.name), branch.name.as_str()),
            Cell::from(i64::try_from(branch.unmerged_commits).unwrap_or(i64::MAX)),
            Cell::from(last_change),
        ]);
    }
    Ok(Outcome::of(count(branches.len()))
        .param("nr_branches", nr_branches)
        .with_extra_info(info))
}

fn owasp_warnings(input: &Input<'_>, priority: Priority) -> Result<Outcome> {
    let report = input.owasp()?;
    let value = report.nr_warnings(&input.ids, priority)?;
    let mut info = ExtraInfo::new(
        "Kwetsbare dependencies",
        &[
            ("dependency", "Dependency"),
            ("nr_vulnerabilities", "Aantal__detail-column-number"),
            ("cves", "CVE's"),
        ],
    );
    match report.dependencies(&input.ids, priority) {
        Ok(dependencies) => {
            for dependency in dependencies {
                let cves: Vec<&str> = dependency.cves.iter().map(|(name, _)| name.as_str()).collect();
                info.push(vec![
                    Cell::from(dependency.file_name.as_str()),
                    Cell::from(i64::try_from(cves.len()).unwrap_or(i64::MAX)),
                    Cell::from(cves.join(", ")),
                ]);
            }
        }
        Err(err) => warn!(error = %err, "Vulnerable dependencies unavailable"),
    }
    Ok(Outcome::of(count(value)).with_extra_info(info))
}

fn total_loc(input: &Input<'_>) -> Result<Outcome> {
    let sonar = input.sonar()?;
    let mut total = 0;
    let mut products = Vec::new();
    for product in input.context.project.main_products() {
        products.push(product.name.as_str());
        if let Some(key) = product.source_ids(input.source_id).first() {
            total += sonar.ncloc(key)?;
        }
    }
    Ok(Outcome::of(total).param("products", products.join(", ")))
}

fn issue_count(input: &Input<'_>) -> Result<Outcome> {
    let issues = input.jira()?.nr_issues(&input.ids)?;
    let mut info = ExtraInfo::new("Lijst van issues", &[("issue", "Issue")]);
    for issue in issues.issues {
        info.push(vec![Cell::link(issue.href, issue.text)]);
    }
    Ok(Outcome::of(issues.count).with_extra_info(info))
}

fn story_points(input: &Input<'_>) -> Result<Outcome> {
    let stories = input.jira()?.issues_with_field(&input.ids)?;
    let mut info = ExtraInfo::new(
        "Lijst van stories",
        &[("issue", "Ready stories"), ("points", "User story punten__detail-column-number")],
    );
    let mut total = 0.0;
    for (issue, points) in stories {
        total += points;
        info.push(vec![Cell::link(issue.href, issue.text), Cell::from(points)]);
    }
    let value = if total.fract() == 0.0 {
        MetricValue::Integer(total as i64)
    } else {
        MetricValue::Decimal(total)
    };
    Ok(Outcome::of(value).with_extra_info(info))
}

fn story_duration(input: &Input<'_>) -> Result<Outcome> {
    let stories = input.jira()?.story_progress(&input.ids)?;
    let mut info = ExtraInfo::new(
        "Gemiddelde looptijd van user stories",
        &[
            ("story", "Story"),
            ("day_in", "Begin uitvoering"),
            ("day_out", "Einde uitvoering"),
            ("days", "Aantal dagen__detail-column-number"),
            ("is_omitted", "_detail-row-alter"),
        ],
    );
    let date_label = |moment: Option<NaiveDateTime>| {
        moment.map_or_else(|| "geen".to_string(), |moment| format_date(Some(moment.date()), true))
    };
    let mut days = 0;
    let mut finished = 0;
    for story in &stories {
        let duration = match (story.start, story.end) {
            (Some(start), Some(end)) => {
                let working_days = count_working_days(start, end);
                days += working_days;
                finished += 1;
                Cell::from(working_days)
            }
            _ => Cell::from("n.v.t"),
        };
        info.push(vec![
            Cell::link(story.issue.href.clone(), story.issue.text.clone()),
            Cell::from(date_label(story.start)),
            Cell::from(date_label(story.end)),
            duration,
            Cell::from(story.start.is_none() || story.end.is_none()),
        ]);
    }
    if finished == 0 {
        return Err(SourceError::Parse("no user stories with a complete progress period".to_string()));
    }
    let average = (days as f64 / f64::from(finished) * 10.0).round() / 10.0;
    Ok(Outcome::of(average)
        .param("total", stories.len())
        .with_extra_info(info))
}

fn action_cards(cards: Vec<hq_sources::trello::CardInfo>, title: &str, message: &'static str) -> Outcome {
    let mut info = ExtraInfo::new(title, &[("url", "Actie naam"), ("message", message)]);
    let value = count(cards.len());
    for card in cards {
        info.push(vec![
            Cell::link(card.url, card.name),
            Cell::from(format_timedelta(card.delta)),
        ]);
    }
    Outcome::of(value).with_extra_info(info)
}

fn ci_jobs(server: &dyn CiServer, ids: &[&str], jobs: Vec<JobInfo>, title: &str) -> Result<Outcome> {
    let number_of_jobs = server.number_of_active_jobs(ids)?;
    let mut info = ExtraInfo::new(
        title,
        &[("link", "Job naam"), ("comment", "Aantal dagen__detail-column-number")],
    );
    let value = count(jobs.len());
    for job in jobs {
        let days = job.days_label();
        info.push(vec![Cell::link(job.url, job.name), Cell::from(days)]);
    }
    Ok(Outcome::of(value)
        .param("number_of_jobs", number_of_jobs)
        .with_extra_info(info))
}
