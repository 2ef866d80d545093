//! JSON documents read by the dashboard front end.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDateTime, Timelike};
use hq_history::{CompactHistory, DATE_FORMAT};
use hq_metrics::{ExtraInfo, Metric, MetricKind};
use hq_model::format::{format_number, html_escape};
use hq_model::{Requirement, SourceKind, Status, SubjectKind, render_value};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{ReportError, Result};
use crate::report::QualityReport;

/// Version written into `metrics.json`.
pub const HQ_VERSION: &str = env!("CARGO_PKG_VERSION");

fn to_json<T: Serialize>(document: &'static str, value: &T) -> Result<String> {
    let mut json = serde_json::to_string_pretty(value)
        .map_err(|source| ReportError::Json { document, source })?;
    json.push('\n');
    Ok(json)
}

fn date_array(date: NaiveDateTime) -> [i64; 6] {
    [
        i64::from(date.year()),
        i64::from(date.month()),
        i64::from(date.day()),
        i64::from(date.hour()),
        i64::from(date.minute()),
        i64::from(date.second()),
    ]
}

// metrics.json

#[derive(Serialize)]
struct MetricsDocument<'a> {
    report_date: [i64; 6],
    report_title: &'a str,
    hq_version: &'static str,
    sections: Vec<SectionEntry<'a>>,
    dashboard: DashboardEntry<'a>,
    metrics: Vec<MetricEntry<'a>>,
}

#[derive(Serialize)]
struct SectionEntry<'a> {
    id: &'a str,
    title: &'a str,
    subtitle: &'a str,
    latest_change_date: String,
}

#[derive(Serialize)]
struct DashboardEntry<'a> {
    headers: Vec<HeaderEntry<'a>>,
    rows: Vec<Vec<CellEntry<'a>>>,
}

#[derive(Serialize)]
struct HeaderEntry<'a> {
    header: &'a str,
    colspan: u32,
}

#[derive(Serialize)]
struct CellEntry<'a> {
    section_id: String,
    section_title: &'a str,
    bgcolor: &'a str,
    colspan: u32,
    rowspan: u32,
}

#[derive(Serialize)]
struct MetricEntry<'a> {
    id_value: String,
    id_format: &'a str,
    stable_metric_id: String,
    name: &'static str,
    unit: &'static str,
    section: &'a str,
    status: &'static str,
    status_value: String,
    status_start_date: Vec<i64>,
    value: String,
    numerical_value: String,
    measurement: String,
    norm: &'a str,
    comment: String,
    metric_class: &'static str,
    extra_info: ExtraInfoEntry<'a>,
}

/// Extra info, or an empty object when the metric has none.
#[derive(Serialize)]
#[serde(untagged)]
enum ExtraInfoEntry<'a> {
    Table(&'a ExtraInfo),
    Empty(Map<String, Value>),
}

/// The text, HTML escaped on one line, followed by its links in sorted order.
pub fn text_with_links(text: &str, urls: &[(String, String)]) -> String {
    let text = html_escape(text).replace('\n', " ");
    if urls.is_empty() {
        return text;
    }
    let mut links: Vec<String> = urls
        .iter()
        .map(|(label, url)| {
            format!(
                "<a href='{}' target='_blank'>{}</a>",
                html_escape(url),
                html_escape(label)
            )
        })
        .collect();
    links.sort();
    format!("{text} [{}]", links.join(", "))
}

fn metric_entry(metric: &Metric) -> MetricEntry<'_> {
    let id_format = metric.id_string();
    let (section, number) = id_format.rsplit_once('-').unwrap_or((id_format, "0"));
    let number: u32 = number.parse().unwrap_or_default();
    let definition = metric.definition();
    MetricEntry {
        id_value: format!("{section}-{number:02}"),
        id_format,
        stable_metric_id: metric.normalized_stable_id(),
        name: definition.name,
        unit: definition.unit,
        section,
        status: metric.status.as_str(),
        status_value: metric.status.status_value().to_string(),
        status_start_date: metric
            .status_start_date
            .map(|date| date_array(date).to_vec())
            .unwrap_or_default(),
        value: render_value(metric.value.as_ref()).trim().to_string(),
        numerical_value: format_number(metric.numerical_value()),
        measurement: text_with_links(&metric.report, &metric.urls),
        norm: &metric.norm,
        comment: text_with_links(&metric.comment, &[]),
        metric_class: metric.kind.class_name(),
        extra_info: metric
            .extra_info
            .as_ref()
            .map_or_else(|| ExtraInfoEntry::Empty(Map::new()), ExtraInfoEntry::Table),
    }
}

/// `metrics.json`: the report header, the dashboard layout and every metric.
///
/// # Errors
///
/// Returns an error when serialization fails.
pub fn metrics_json(report: &QualityReport) -> Result<String> {
    let sections = report
        .sections()
        .iter()
        .map(|section| SectionEntry {
            id: &section.id,
            title: &section.title,
            subtitle: &section.subtitle,
            latest_change_date: section
                .latest_change_date
                .map(|date| date.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
        })
        .collect();

    let dashboard = report.dashboard();
    let headers = dashboard
        .columns
        .iter()
        .map(|column| HeaderEntry {
            header: &column.header,
            colspan: column.colspan,
        })
        .collect();
    let rows = dashboard
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| {
                    let section = report.get_section(&cell.cell.to_uppercase());
                    let (section_id, section_title) = match section {
                        Some(section) => (section.id.clone(), section.title.as_str()),
                        None => (String::new(), cell.cell.as_str()),
                    };
                    CellEntry {
                        section_id,
                        section_title,
                        bgcolor: &cell.color,
                        colspan: cell.colspan,
                        rowspan: cell.rowspan,
                    }
                })
                .collect()
        })
        .collect();

    let document = MetricsDocument {
        report_date: date_array(report.date()),
        report_title: report.title(),
        hq_version: HQ_VERSION,
        sections,
        dashboard: DashboardEntry { headers, rows },
        metrics: report.metrics().map(metric_entry).collect(),
    };
    to_json("metrics.json", &document)
}

// meta_history.json

/// `meta_history.json`: per history date a JavaScript date with a zero based
/// month, followed by the status counts in a fixed order.
///
/// # Errors
///
/// Returns an error when serialization fails.
pub fn meta_history_json(history: Option<&CompactHistory>) -> Result<String> {
    let mut table: Vec<([i64; 6], Vec<u64>)> = Vec::new();
    for record in history.map(CompactHistory::statuses).unwrap_or_default() {
        let date = match NaiveDateTime::parse_from_str(&record.date, DATE_FORMAT) {
            Ok(date) => date,
            Err(err) => {
                warn!(date = %record.date, error = %err, "Skipping history date");
                continue;
            }
        };
        let mut date = date_array(date);
        date[1] -= 1;
        let counts = Status::HISTORY_ORDER
            .iter()
            .map(|status| record.counts.get(status.as_str()).copied().unwrap_or(0))
            .collect();
        table.push((date, counts));
    }
    to_json("meta_history.json", &table)
}

// meta_data.json

#[derive(Serialize)]
struct MetaData {
    domain_objects: Vec<DomainObjectEntry>,
    requirements: Vec<RequirementEntry>,
    metrics: Vec<MetricClassEntry>,
    metric_sources: Vec<MetricSourceEntry>,
}

#[derive(Serialize)]
struct DomainObjectEntry {
    included: bool,
    name: &'static str,
    id: &'static str,
    default_requirements: Vec<&'static str>,
    optional_requirements: Vec<&'static str>,
}

#[derive(Serialize)]
struct RequirementEntry {
    included: bool,
    name: &'static str,
    id: &'static str,
    metrics: Vec<&'static str>,
}

#[derive(Serialize)]
struct MetricClassEntry {
    included: bool,
    name: &'static str,
    id: &'static str,
    norm: String,
}

#[derive(Serialize)]
struct MetricSourceEntry {
    included: bool,
    name: &'static str,
    id: String,
    urls: Vec<String>,
}

fn requirement_names(requirements: &[Requirement]) -> Vec<&'static str> {
    requirements
        .iter()
        .map(|requirement| requirement.name())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn source_id(kind: SourceKind) -> String {
    match serde_json::to_value(kind) {
        Ok(Value::String(id)) => id,
        _ => kind.name().to_string(),
    }
}

/// `meta_data.json`: every subject kind, requirement, metric class and
/// source kind, flagged with whether the report includes it.
///
/// # Errors
///
/// Returns an error when serialization fails.
pub fn meta_data_json(report: &QualityReport) -> Result<String> {
    let subject_kinds = report.included_subject_kinds();
    let mut domain_objects: Vec<DomainObjectEntry> = SubjectKind::ALL
        .into_iter()
        .map(|kind| DomainObjectEntry {
            included: subject_kinds.contains(&kind),
            name: kind.name(),
            id: kind.name(),
            default_requirements: requirement_names(kind.default_requirements()),
            optional_requirements: requirement_names(kind.optional_requirements()),
        })
        .collect();
    domain_objects.sort_by_key(|entry| entry.name);

    let included_requirements = report.included_requirements();
    let mut requirements: Vec<RequirementEntry> = Requirement::ALL
        .into_iter()
        .map(|requirement| {
            let mut metrics: Vec<&'static str> = MetricKind::for_requirement(requirement)
                .iter()
                .map(|kind| kind.definition().name)
                .collect();
            metrics.sort_unstable();
            RequirementEntry {
                included: included_requirements.contains(&requirement),
                name: requirement.name(),
                id: requirement.id(),
                metrics,
            }
        })
        .collect();
    requirements.sort_by_key(|entry| entry.name);

    let included_kinds = report.included_metric_kinds();
    let mut metrics: Vec<MetricClassEntry> = MetricKind::ALL
        .into_iter()
        .map(|kind| {
            let definition = kind.definition();
            MetricClassEntry {
                included: included_kinds.contains(&kind),
                name: definition.name,
                id: kind.class_name(),
                norm: definition.default_norm(),
            }
        })
        .collect();
    metrics.sort_by_key(|entry| entry.name);

    let mut metric_sources: Vec<MetricSourceEntry> = SourceKind::ALL
        .into_iter()
        .map(|kind| {
            let urls: Vec<String> = report
                .source_urls()
                .iter()
                .filter(|(source_kind, url)| *source_kind == kind && !url.is_empty())
                .map(|(_, url)| url.clone())
                .collect();
            MetricSourceEntry {
                included: !urls.is_empty(),
                name: kind.name(),
                id: source_id(kind),
                urls,
            }
        })
        .collect();
    metric_sources.sort_by_key(|entry| entry.name);

    let document = MetaData {
        domain_objects,
        requirements,
        metrics,
        metric_sources,
    };
    to_json("meta_data.json", &document)
}
