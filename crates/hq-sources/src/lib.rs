//! Metric source adapters for the quality dashboard.
//!
//! Each adapter wraps the HTTP API or report format of one external system
//! and answers the questions the metrics ask, such as the number of lines
//! of code of a product or the failing jobs of a build server.
//!
//! # Architecture
//!
//! - [`opener`] - cached, authenticated HTTP reads behind the [`UrlRead`] trait
//! - [`source`] - traits shared by interchangeable sources ([`TestReport`], [`CiServer`],
//!   [`CoverageReport`])
//! - one module per adapter, e.g. [`sonar`], [`jenkins`], [`jira`]
//! - [`git`] - unmerged branches from a local clone, through the `git` executable
//! - [`registry`] - the configured source instances of a project
//!
//! Adapters return [`Result`]s; the metric layer turns errors into missing
//! values. Tests substitute [`fake::FakeOpener`] for HTTP and
//! [`fake::FakeCommands`] for `git`.

pub mod checkmarx;
pub mod error;
pub mod fake;
pub mod git;
pub mod gitlab;
pub mod happiness;
pub mod html;
pub mod jacoco;
pub mod jenkins;
pub mod jenkins_test_report;
pub mod jira;
pub mod junit;
pub mod lcov;
pub mod opener;
pub mod owasp;
pub mod registry;
pub mod robot_framework;
pub mod sonar;
pub mod source;
pub mod testng;
pub mod trello;
pub mod xml;
pub mod zap;

pub use error::{Result, SourceError};
pub use opener::{Credentials, TimeoutTracker, UrlOpener, UrlRead};
pub use registry::{Source, SourceRegistry};
pub use source::{CiServer, CoverageReport, JobInfo, MetricSource, TestCounts, TestReport};
