//! CLI argument definitions for the quality report generator.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "quality-report",
    version,
    about = "Generate a software quality dashboard for a project",
    long_about = "Generate a software quality dashboard for a project.\n\n\
                  Reads metrics from Sonar, Jenkins, GitLab, Jira, Trello and test reports,\n\
                  evaluates them against their norms and writes JSON files and sparklines\n\
                  for the dashboard front end."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Measure a project and write its quality report.
    Report(ReportArgs),

    /// List all metric classes with their default norms.
    Metrics,

    /// List all requirements and the metric classes they bring.
    Requirements,

    /// Validate a project definition and list its subjects.
    Check(CheckArgs),
}

#[derive(Parser)]
pub struct ReportArgs {
    /// Project definition file (TOML).
    #[arg(long = "project", value_name = "FILE")]
    pub project: PathBuf,

    /// Directory the report files are written to.
    #[arg(long = "report", value_name = "DIR")]
    pub report: PathBuf,

    /// Exit with code 2 when a metric needs direct action.
    #[arg(long = "failure-exit-code")]
    pub failure_exit_code: bool,
}

#[derive(Parser)]
pub struct CheckArgs {
    /// Project definition file (TOML).
    #[arg(long = "project", value_name = "FILE")]
    pub project: PathBuf,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
