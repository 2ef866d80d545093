use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use comfy_table::{Cell, Table};
use hq_history::CompactHistory;
use hq_metrics::MetricKind;
use hq_model::{Project, Requirement};
use hq_report::{QualityReport, WrittenReport, write_report};
use hq_sources::SourceRegistry;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, info_span};

use crate::cli::{CheckArgs, ReportArgs};
use crate::summary::{apply_table_style, header_cell};

/// Everything a report run produced.
#[derive(Debug)]
pub struct ReportOutcome {
    pub report: QualityReport,
    pub written: WrittenReport,
    pub output_dir: PathBuf,
    /// History file that was updated, if the project keeps one.
    pub history_file: Option<PathBuf>,
}

impl ReportOutcome {
    /// Process exit code: 2 when asked to fail and direct action is needed.
    pub fn exit_code(&self, failure_exit_code: bool) -> i32 {
        if failure_exit_code && self.report.direct_action_needed() {
            2
        } else {
            0
        }
    }
}

fn spinner(message: &str) -> ProgressBar {
    if !io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]") {
        bar.set_style(style);
    }
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

pub fn run_report(args: &ReportArgs) -> Result<ReportOutcome> {
    run_report_at(args, Local::now().naive_local())
}

/// Runs the report as if it is `now`.
pub fn run_report_at(args: &ReportArgs, now: NaiveDateTime) -> Result<ReportOutcome> {
    let project = Project::load(&args.project)
        .with_context(|| format!("load project {}", args.project.display()))?;
    let span = info_span!("report", project = %project.name);
    let _guard = span.enter();

    let sources = SourceRegistry::from_project(&project);
    info!(sources = sources.len(), "created metric sources");

    let mut history = project
        .history_file
        .as_deref()
        .map(CompactHistory::load)
        .transpose()
        .context("load history")?;

    let progress = spinner("Measuring metrics");
    let build_start = Instant::now();
    let report = QualityReport::build(&project, &sources, history.as_ref(), now);
    progress.finish_and_clear();
    let mut report = report.context("build report")?;
    info!(
        metrics = report.metrics().count(),
        duration_ms = build_start.elapsed().as_millis(),
        "report built"
    );

    let history_file = match history.as_mut() {
        Some(history) => {
            report.record_run(history);
            history.save().context("save history")?;
            Some(history.path().to_path_buf())
        }
        None => None,
    };

    let written = write_report(&report, history.as_ref(), &args.report)
        .with_context(|| format!("write report to {}", args.report.display()))?;

    Ok(ReportOutcome {
        report,
        written,
        output_dir: args.report.clone(),
        history_file,
    })
}

/// Every metric class with its name and default norm.
pub fn metrics_table() -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Class"), header_cell("Name"), header_cell("Norm")]);
    apply_table_style(&mut table);
    for kind in MetricKind::ALL {
        let definition = kind.definition();
        table.add_row(vec![
            Cell::new(kind.class_name()),
            Cell::new(definition.name),
            Cell::new(definition.default_norm()),
        ]);
    }
    table
}

pub fn run_metrics() -> Result<()> {
    println!("{}", metrics_table());
    Ok(())
}

/// Every requirement with the metric classes it brings.
pub fn requirements_table() -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Id"), header_cell("Name"), header_cell("Metrics")]);
    apply_table_style(&mut table);
    for requirement in Requirement::ALL {
        let metrics = MetricKind::for_requirement(requirement)
            .iter()
            .map(|kind| kind.class_name())
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            Cell::new(requirement.id()),
            Cell::new(requirement.name()),
            Cell::new(metrics),
        ]);
    }
    table
}

pub fn run_requirements() -> Result<()> {
    println!("{}", requirements_table());
    Ok(())
}

/// Subjects of a project with their short names and requirements.
pub fn subjects_table(project: &Project) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Kind"),
        header_cell("Name"),
        header_cell("Short name"),
        header_cell("Requirements"),
    ]);
    apply_table_style(&mut table);
    for subject in project.subjects() {
        let requirements = subject
            .requirements()
            .iter()
            .map(|requirement| requirement.id())
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            Cell::new(subject.kind.name()),
            Cell::new(&subject.name),
            Cell::new(&subject.short_name),
            Cell::new(requirements),
        ]);
    }
    table
}

pub fn run_check(args: &CheckArgs) -> Result<()> {
    let project = Project::load(&args.project)
        .with_context(|| format!("load project {}", args.project.display()))?;
    let sources = SourceRegistry::from_project(&project);
    println!("Project: {}/{}", project.organization, project.name);
    println!("Sources: {} of {} configured", sources.len(), project.sources.len());
    println!("{}", subjects_table(&project));
    Ok(())
}
