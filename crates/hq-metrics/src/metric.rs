//! A measured metric of one subject.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use hq_history::{CompactHistory, MetricRecord};
use hq_model::format::{version_number_to_numerical, version_parts};
use hq_model::target::adapted_target_explanation;
use hq_model::{MetricOptions, MetricValue, SourceKind, SourceRole, Status, Subject, render_value};
use hq_sources::Source;
use tracing::{debug, warn};

use crate::catalog::{
    DefaultTarget, Direction, MISSING_SOURCE_ID_TEMPLATE, MISSING_SOURCE_TEMPLATE, MISSING_TEMPLATE,
    MetricDefinition,
};
use crate::context::MetricContext;
use crate::evaluate::{Norm, smiley_value};
use crate::extra_info::ExtraInfo;
use crate::kind::MetricKind;
use crate::measure::{Input, Outcome, measure};
use crate::template::render;

const MAX_NAME_LENGTH: usize = 200;
const UNKNOWN_SOURCE_LABEL: &str = "Unknown metric source";
const NO_SOURCE_CLASS: &str = "<metric has no metric source defined>";

/// How a metric found its source.
pub(crate) enum Resolution<'a> {
    /// Meta metrics read other metrics, not a source.
    Meta,
    /// No source is configured for the role.
    NoSource,
    /// Sources exist for the role, but the subject has no ids for them.
    NoIds { source_id: &'a str, source: &'a Source },
    Found(Input<'a>),
}

fn resolve<'a>(kind: MetricKind, subject: &'a Subject, context: &'a MetricContext<'a>) -> Resolution<'a> {
    let definition = kind.definition();
    let Some(role) = definition.role else {
        return Resolution::Meta;
    };
    let candidates = context.sources.for_role(role);
    let Some(&(first_id, first)) = candidates.first() else {
        return Resolution::NoSource;
    };
    let with_ids = candidates.iter().find_map(|(source_id, source)| {
        let ids = subject.source_ids(source_id);
        (!ids.is_empty()).then_some((*source_id, *source, ids))
    });
    let (source_id, source, ids) = match with_ids {
        Some(found) => found,
        None if definition.needs_ids => {
            return Resolution::NoIds {
                source_id: first_id,
                source: first,
            };
        }
        None => (first_id, first, Vec::new()),
    };
    Resolution::Found(Input {
        kind,
        subject,
        source_id,
        source,
        ids,
        context,
    })
}

/// One metric of a subject with its value, status and texts.
#[derive(Debug, Clone)]
pub struct Metric {
    pub kind: MetricKind,
    pub subject_name: String,
    stable_id: String,
    id_string: String,
    pub value: Option<MetricValue>,
    pub status: Status,
    pub target: MetricValue,
    pub low_target: MetricValue,
    pub report: String,
    pub norm: String,
    pub comment: String,
    /// Labelled urls in display order.
    pub urls: Vec<(String, String)>,
    pub extra_info: Option<ExtraInfo>,
    pub source_id: Option<String>,
    pub source_kind: Option<SourceKind>,
    /// Since when the metric has its current status, when history is kept.
    pub status_start_date: Option<NaiveDateTime>,
    /// Numerical values of recent runs, -1 for runs without a value.
    pub recent_history: Vec<f64>,
}

impl Metric {
    /// Measures `kind` for `subject`. Source failures give a missing value.
    pub fn measure(kind: MetricKind, subject: &Subject, context: &MetricContext<'_>) -> Self {
        let resolution = resolve(kind, subject, context);
        let outcome = match &resolution {
            Resolution::Found(input) => measure(input).unwrap_or_else(|err| {
                warn!(
                    metric = kind.class_name(),
                    subject = %subject.name,
                    source = input.source_id,
                    error = %err,
                    "Metric value unavailable"
                );
                Outcome::default()
            }),
            Resolution::Meta | Resolution::NoSource | Resolution::NoIds { .. } => Outcome::default(),
        };
        Self::assemble(kind, subject, context, &resolution, outcome)
    }

    pub(crate) fn assemble(
        kind: MetricKind,
        subject: &Subject,
        context: &MetricContext<'_>,
        resolution: &Resolution<'_>,
        outcome: Outcome,
    ) -> Self {
        let definition = kind.definition();
        let options = subject.metric_options(kind.class_name());
        let target = options
            .and_then(|options| options.target.clone())
            .unwrap_or_else(|| definition.target.to_value());
        let low_target = options
            .and_then(|options| options.low_target.clone())
            .unwrap_or_else(|| definition.low_target.to_value());
        let debt = options
            .and_then(|options| options.debt.as_ref())
            .and_then(|debt| match debt.to_target() {
                Ok(debt) => Some(debt),
                Err(err) => {
                    warn!(metric = kind.class_name(), subject = %subject.name, error = %err, "Ignoring debt target");
                    None
                }
            });

        let status = match (resolution, &outcome.value) {
            (Resolution::NoSource | Resolution::NoIds { .. }, _) => Status::MissingSource,
            (_, None) => Status::Missing,
            (_, Some(value)) => Norm {
                direction: definition.direction,
                target: target.clone(),
                low_target: low_target.clone(),
                perfect: definition.perfect.map(DefaultTarget::to_value),
                debt: debt.as_ref().map(|debt| debt.target_value(context.now)),
            }
            .status(value, outcome.force_red),
        };

        let params = report_params(definition, &subject.name, &target, &low_target, &outcome);
        let template = match resolution {
            Resolution::NoSource => MISSING_SOURCE_TEMPLATE,
            Resolution::NoIds { .. } => MISSING_SOURCE_ID_TEMPLATE,
            Resolution::Meta | Resolution::Found(_) if outcome.value.is_none() => MISSING_TEMPLATE,
            Resolution::Meta | Resolution::Found(_) => outcome.template.unwrap_or(
                match definition.perfect_template {
                    Some(perfect) if status == Status::Perfect => perfect,
                    _ => definition.template,
                },
            ),
        };

        let (source_id, source, urls) = match resolution {
            Resolution::Found(input) => (Some(input.source_id), Some(input.source), input.urls()),
            Resolution::NoIds { source_id, source } => (
                Some(*source_id),
                Some(*source),
                vec![source.as_metric_source().url().to_string()],
            ),
            Resolution::Meta | Resolution::NoSource => (None, None, Vec::new()),
        };
        let source_kind = source.map(Source::kind);

        let mut comment = Vec::new();
        if low_target != definition.low_target.to_value() {
            comment.push(adapted_target_explanation(
                &definition.low_target.to_string(),
                &low_target.to_string(),
                definition.unit,
            ));
        }
        if let Some(debt) = &debt {
            comment.push(debt.explanation(definition.unit, context.now));
        }
        if let Some(text) = options.and_then(|options| options.comment.as_deref()) {
            comment.push(text.to_string());
        }
        if let Some(remark) = source.and_then(|source| ignored_lists_remark(definition, source)) {
            comment.push(remark);
        }
        if kind == MetricKind::UnmergedBranches {
            comment.extend(options.map(branch_filter_remarks).unwrap_or_default());
        }

        let stable_id = if kind.is_meta() {
            kind.class_name().to_string()
        } else {
            format!("{}{}", kind.class_name(), subject.name)
        };
        debug!(
            metric = %stable_id,
            %status,
            value = %render_value(outcome.value.as_ref()),
            "Measured metric"
        );
        let report = render(template, &params);
        let norm = render(definition.norm_template, &params);
        let mut metric = Self {
            kind,
            subject_name: subject.name.clone(),
            stable_id,
            id_string: String::new(),
            value: outcome.value,
            status,
            target,
            low_target,
            report,
            norm,
            comment: comment.join(" "),
            urls: labelled_urls(source_kind, urls),
            extra_info: outcome.extra_info,
            source_id: source_id.map(str::to_string),
            source_kind,
            status_start_date: None,
            recent_history: Vec::new(),
        };
        if let Some(history) = context.history {
            metric.read_history(history, context.now);
        }
        metric
    }

    /// Takes the recent values and the status start date from `history`.
    /// Called again once the current run has been added to it.
    pub fn read_history(&mut self, history: &CompactHistory, now: NaiveDateTime) {
        self.recent_history = history.recent_history(&self.stable_id);
        if self.kind == MetricKind::TotalLoc {
            relative_to_minimum(&mut self.recent_history);
        }
        self.status_start_date = Some(history.status_start_date(&self.stable_id, self.status, now));
    }

    pub fn definition(&self) -> &'static MetricDefinition {
        self.kind.definition()
    }

    /// Id that doesn't depend on the numbering of metrics in the report.
    pub fn stable_id(&self) -> &str {
        &self.stable_id
    }

    /// The stable id with only alphanumerics and underscores, usable in file
    /// names. The codes of replaced characters keep it unique.
    pub fn normalized_stable_id(&self) -> String {
        let mut normalized = String::with_capacity(self.stable_id.len() * 2);
        let mut codes = String::new();
        for ch in self.stable_id.chars() {
            if ch.is_alphanumeric() {
                normalized.push(ch);
            } else {
                normalized.push('_');
                codes.push_str(&u32::from(ch).to_string());
            }
        }
        normalized.push('_');
        normalized.push_str(&codes);
        normalized
    }

    /// Report id, e.g. "PD-3". Empty until the report numbers the metric.
    pub fn id_string(&self) -> &str {
        &self.id_string
    }

    pub fn set_id_string(&mut self, id_string: impl Into<String>) {
        self.id_string = id_string.into();
    }

    /// The value as a number for history and charts, -1 when missing.
    pub fn numerical_value(&self) -> f64 {
        let Some(value) = &self.value else {
            return -1.0;
        };
        match self.definition().direction {
            Direction::Smiley => value
                .as_text()
                .and_then(smiley_value)
                .map_or(-1.0, |score| score as f64),
            Direction::Version => version_number_to_numerical(&version_parts(&value.to_string())) as f64,
            Direction::LowerIsBetter | Direction::HigherIsBetter => value.as_f64().unwrap_or(-1.0),
        }
    }

    /// Minimum and maximum of the chart's y axis. Ratios always span 0 to
    /// 100; otherwise missing runs count as -1.
    pub fn y_axis_range(&self) -> (f64, f64) {
        if self.kind.is_ratio() {
            return (0.0, 100.0);
        }
        if self.definition().direction == Direction::Smiley {
            return (0.0, 2.0);
        }
        let mut values = self.recent_history.iter().copied();
        let Some(first) = values.next() else {
            return (0.0, 100.0);
        };
        let (min, max) =
            values.fold((first, first), |(min, max), value| (min.min(value), max.max(value)));
        if min == max { (min - 1.0, max + 1.0) } else { (min, max) }
    }

    /// Label of the source the metric reads.
    pub fn source_label(&self) -> &'static str {
        self.source_kind.map_or(UNKNOWN_SOURCE_LABEL, SourceKind::name)
    }

    /// What the history keeps of this run.
    pub fn to_record(&self) -> MetricRecord {
        MetricRecord {
            stable_id: self.stable_id.clone(),
            value: self.value.as_ref().map(|_| self.numerical_value()),
            status: self.status,
        }
    }
}

/// Measures every metric the subject's requirements bring, in requirement order.
pub fn subject_metrics(subject: &Subject, context: &MetricContext<'_>) -> Vec<Metric> {
    subject
        .requirements()
        .into_iter()
        .flat_map(MetricKind::for_requirement)
        .map(|kind| Metric::measure(*kind, subject, context))
        .collect()
}

fn truncated(name: &str) -> String {
    if name.chars().count() > MAX_NAME_LENGTH {
        let mut short: String = name.chars().take(MAX_NAME_LENGTH).collect();
        short.push_str("...");
        short
    } else {
        name.to_string()
    }
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn report_params(
    definition: &'static MetricDefinition,
    name: &str,
    target: &MetricValue,
    low_target: &MetricValue,
    outcome: &Outcome,
) -> BTreeMap<&'static str, String> {
    let mut params = BTreeMap::new();
    params.insert("name", truncated(name));
    params.insert("metric", lowercase_first(definition.name));
    params.insert("unit", definition.unit.to_string());
    params.insert("target", target.to_string());
    params.insert("low_target", low_target.to_string());
    params.insert("value", render_value(outcome.value.as_ref()));
    params.insert(
        "metric_source_class",
        definition.role.map_or(NO_SOURCE_CLASS, SourceRole::name).to_string(),
    );
    for (key, value) in definition.params {
        params.insert(*key, (*value).to_string());
    }
    for (key, value) in &outcome.params {
        params.insert(*key, value.clone());
    }
    params
}

fn ignored_lists_remark(definition: &MetricDefinition, source: &Source) -> Option<String> {
    if !matches!(definition.role, Some(SourceRole::ActionLog | SourceRole::RiskLog)) {
        return None;
    }
    let lists = source.as_trello()?.ignored_lists();
    (!lists.is_empty()).then(|| format!("Genegeerde lijsten: {}.", lists.join(", ")))
}

fn branch_filter_remarks(options: &MetricOptions) -> Vec<String> {
    let mut remarks = Vec::new();
    if !options.branches_to_include.is_empty() {
        remarks.push(format!(
            "Alleen deze branches worden bewaakt: {}.",
            options.branches_to_include.join(", ")
        ));
    }
    if let Some(pattern) = options.branches_to_ignore_re.as_deref().filter(|re| !re.is_empty()) {
        remarks.push(format!(
            "Branches die voldoen aan de reguliere expressie {pattern} zijn genegeerd."
        ));
    }
    remarks
}

fn labelled_urls(kind: Option<SourceKind>, urls: Vec<String>) -> Vec<(String, String)> {
    let label = kind.map_or(UNKNOWN_SOURCE_LABEL, SourceKind::name);
    let urls: Vec<String> = urls.into_iter().filter(|url| !url.is_empty()).collect();
    let count = urls.len();
    if count == 1 {
        return urls.into_iter().map(|url| (label.to_string(), url)).collect();
    }
    urls.into_iter()
        .enumerate()
        .map(|(index, url)| (format!("{label} ({}/{count})", index + 1), url))
        .collect()
}

/// Shows growth instead of absolute size.
fn relative_to_minimum(values: &mut [f64]) {
    let minimum = values
        .iter()
        .copied()
        .filter(|value| *value >= 0.0)
        .fold(f64::INFINITY, f64::min);
    if minimum.is_finite() {
        for value in values.iter_mut().filter(|value| **value >= 0.0) {
            *value -= minimum;
        }
    }
}
