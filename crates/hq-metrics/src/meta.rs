//! Metrics about the other metrics of the report.

use hq_model::format::percentage;
use hq_model::{MetricValue, Status};

use crate::catalog::Direction;
use crate::context::MetricContext;
use crate::kind::MetricKind;
use crate::measure::Outcome;
use crate::metric::{Metric, Resolution};

/// Statuses counted by a meta metric.
pub fn counted_statuses(kind: MetricKind) -> &'static [Status] {
    match kind {
        MetricKind::GreenMetaMetric => &[Status::Green, Status::Perfect],
        MetricKind::RedMetaMetric => &[Status::Red],
        MetricKind::YellowMetaMetric => &[Status::Yellow],
        MetricKind::GreyMetaMetric => &[Status::Grey],
        MetricKind::MissingMetaMetric => &[Status::Missing, Status::MissingSource],
        _ => &[],
    }
}

impl Metric {
    /// Percentage of the non-meta `metrics` whose status `kind` counts.
    /// Meta metrics belong to the project.
    pub fn meta(kind: MetricKind, metrics: &[Metric], context: &MetricContext<'_>) -> Self {
        let statuses = counted_statuses(kind);
        let measured = metrics.iter().filter(|metric| !metric.kind.is_meta());
        let (numerator, denominator) = measured.fold((0_u32, 0_u32), |(numerator, denominator), metric| {
            (
                numerator + u32::from(statuses.contains(&metric.status)),
                denominator + 1,
            )
        });
        let lower_is_better = kind.definition().direction == Direction::LowerIsBetter;
        let outcome = Outcome {
            value: Some(MetricValue::Integer(percentage(
                f64::from(numerator),
                f64::from(denominator),
                lower_is_better,
            ))),
            params: vec![
                ("numerator", numerator.to_string()),
                ("denominator", denominator.to_string()),
            ],
            ..Outcome::default()
        };
        Self::assemble(kind, &context.project.subject, context, &Resolution::Meta, outcome)
    }
}

/// The meta metrics over `metrics`, in catalog order.
pub fn meta_metrics(metrics: &[Metric], context: &MetricContext<'_>) -> Vec<Metric> {
    MetricKind::META
        .iter()
        .map(|kind| Metric::meta(*kind, metrics, context))
        .collect()
}
