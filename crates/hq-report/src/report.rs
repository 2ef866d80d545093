//! The quality report: metrics of every subject grouped in sections.

use std::collections::{BTreeSet, HashSet};

use chrono::NaiveDateTime;
use hq_history::CompactHistory;
use hq_metrics::{Metric, MetricContext, MetricKind, meta_metrics};
use hq_model::{
    Dashboard, Project, RESERVED_SHORT_NAMES, Requirement, SourceKind, SourceRole, Subject,
    SubjectKind,
};
use hq_sources::SourceRegistry;
use tracing::{debug, info, info_span, warn};

use crate::error::{ReportError, Result};

/// A group of metrics with a header, e.g. one product.
#[derive(Debug, Clone)]
pub struct Section {
    /// Prefix of the metric ids in this section.
    pub id: String,
    pub title: String,
    pub subtitle: String,
    /// Most recent analysis of the product, for product sections.
    pub latest_change_date: Option<NaiveDateTime>,
    pub metrics: Vec<Metric>,
}

impl Section {
    fn new(id: &str, title: impl Into<String>, mut metrics: Vec<Metric>) -> Self {
        for (index, metric) in metrics.iter_mut().enumerate() {
            metric.set_id_string(format!("{id}-{}", index + 1));
        }
        Self {
            id: id.to_string(),
            title: title.into(),
            subtitle: String::new(),
            latest_change_date: None,
            metrics,
        }
    }
}

/// Quality report of a project.
#[derive(Debug, Clone)]
pub struct QualityReport {
    title: String,
    date: NaiveDateTime,
    sections: Vec<Section>,
    dashboard: Dashboard,
    requirements: BTreeSet<Requirement>,
    subject_kinds: BTreeSet<SubjectKind>,
    source_urls: Vec<(SourceKind, String)>,
}

impl QualityReport {
    /// Measures every metric of the project.
    ///
    /// # Errors
    ///
    /// Returns an error when two subjects share a short name or a subject
    /// uses a reserved short name.
    pub fn build(
        project: &Project,
        sources: &SourceRegistry,
        history: Option<&CompactHistory>,
        now: NaiveDateTime,
    ) -> Result<Self> {
        let _span = info_span!("build_report", project = %project.name).entered();
        check_short_names(project)?;

        let mut context = MetricContext::new(project, sources, now);
        if let Some(history) = history {
            context = context.with_history(history);
        }
        let mut requirements = BTreeSet::new();
        let mut measure = |subject: &Subject, keep: &dyn Fn(Requirement) -> bool| {
            let mut metrics = Vec::new();
            for requirement in subject.requirements().into_iter().filter(|r| keep(*r)) {
                requirements.insert(requirement);
                for kind in MetricKind::for_requirement(requirement) {
                    metrics.push(Metric::measure(*kind, subject, &context));
                }
            }
            metrics
        };

        let mut sections = vec![
            Section::new(
                "PC",
                "Proceskwaliteit algemeen",
                measure(&project.subject, &|requirement: Requirement| {
                    requirement != Requirement::TrustedProductMaintainability
                }),
            ),
            Section::new(
                "PD",
                "Productkwaliteit algemeen",
                measure(&project.subject, &|requirement: Requirement| {
                    requirement == Requirement::TrustedProductMaintainability
                }),
            ),
        ];
        for environment in sorted(&project.environments) {
            sections.push(Section::new(
                &environment.short_name,
                environment.name.clone(),
                measure(environment, &|_: Requirement| true),
            ));
        }
        for product in sorted(&project.products) {
            let metrics = measure(product, &|_: Requirement| true);
            let mut section = Section::new(&product.short_name, product.name.clone(), metrics);
            if let Some((version, analysis)) = sonar_details(product, sources) {
                section.subtitle = version;
                section.latest_change_date = analysis;
            }
            sections.push(section);
        }
        for team in sorted(&project.teams) {
            sections.push(Section::new(
                &team.short_name,
                format!("Team {}", team.name),
                measure(team, &|_: Requirement| true),
            ));
        }
        sections.retain(|section| !section.metrics.is_empty());

        let measured: Vec<Metric> = sections
            .iter()
            .flat_map(|section| section.metrics.iter().cloned())
            .collect();
        sections.push(Section::new("MM", "Meta metrieken", meta_metrics(&measured, &context)));
        info!(
            sections = sections.len(),
            metrics = measured.len(),
            "Built quality report"
        );

        let mut subject_kinds: BTreeSet<SubjectKind> =
            project.subjects().map(|subject| subject.kind).collect();
        subject_kinds.insert(SubjectKind::Project);
        let source_urls = SourceRole::ALL
            .into_iter()
            .flat_map(|role| sources.for_role(role))
            .map(|(_, source)| (source.kind(), source.as_metric_source().url().to_string()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Ok(Self {
            title: format!("Kwaliteitsrapportage {}/{}", project.organization, project.name),
            date: now,
            sections,
            dashboard: project.dashboard.clone(),
            requirements,
            subject_kinds,
            source_urls,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// When the report was generated.
    pub fn date(&self) -> NaiveDateTime {
        self.date
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn get_section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.id == id)
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    /// All metrics in report order, meta metrics last.
    pub fn metrics(&self) -> impl Iterator<Item = &Metric> {
        self.sections.iter().flat_map(|section| &section.metrics)
    }

    /// Adds this run to `history` and rereads the recent values and status
    /// start dates, so charts end with the current run.
    pub fn record_run(&mut self, history: &mut CompactHistory) {
        history.add_metrics(self.date, self.metrics().map(Metric::to_record));
        let now = self.date;
        for metric in self.sections.iter_mut().flat_map(|section| &mut section.metrics) {
            metric.read_history(history, now);
        }
    }

    /// Whether any metric is red or could not be measured. A report without
    /// metrics needs action too.
    pub fn direct_action_needed(&self) -> bool {
        let mut metrics = self.metrics().filter(|metric| !metric.kind.is_meta()).peekable();
        if metrics.peek().is_none() {
            return true;
        }
        metrics.any(|metric| metric.status.needs_action())
    }

    /// Requirements that brought metrics into the report.
    pub fn included_requirements(&self) -> &BTreeSet<Requirement> {
        &self.requirements
    }

    pub fn included_metric_kinds(&self) -> BTreeSet<MetricKind> {
        self.metrics().map(|metric| metric.kind).collect()
    }

    pub fn included_subject_kinds(&self) -> &BTreeSet<SubjectKind> {
        &self.subject_kinds
    }

    /// Kinds and urls of the sources the project uses.
    pub fn source_urls(&self) -> &[(SourceKind, String)] {
        &self.source_urls
    }
}

fn check_short_names(project: &Project) -> Result<()> {
    let mut seen = HashSet::new();
    let subjects = project.products.iter().chain(&project.environments).chain(&project.teams);
    for subject in subjects {
        let short_name = subject.short_name.as_str();
        if RESERVED_SHORT_NAMES.contains(&short_name) {
            return Err(ReportError::ReservedShortName {
                short_name: short_name.to_string(),
                subject: subject.name.clone(),
            });
        }
        if !seen.insert(short_name) {
            return Err(ReportError::DuplicateSection(short_name.to_string()));
        }
    }
    Ok(())
}

fn sorted(subjects: &[Subject]) -> Vec<&Subject> {
    let mut sorted: Vec<&Subject> = subjects.iter().collect();
    sorted.sort_by(|a, b| (&a.name, &a.short_name).cmp(&(&b.name, &b.short_name)));
    sorted
}

/// Version and analysis date of the product in the first Sonar that knows it.
fn sonar_details(
    product: &Subject,
    sources: &SourceRegistry,
) -> Option<(String, Option<NaiveDateTime>)> {
    sources.for_role(SourceRole::Sonar).into_iter().find_map(|(source_id, source)| {
        let sonar = source.as_sonar()?;
        let key = product.source_ids(source_id).first().copied()?;
        let analysis = match sonar.analysis_datetime(key) {
            Ok(analysis) => Some(analysis),
            Err(err) => {
                warn!(product = %product.name, error = %err, "Analysis date unavailable");
                None
            }
        };
        let version = sonar.product_version(key);
        debug!(product = %product.name, %version, "Read product version");
        Some((version, analysis))
    })
}
