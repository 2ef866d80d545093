//! Metric classes of the quality dashboard.
//!
//! A metric reads one or two numbers from a metric source, compares the
//! result against its norm and describes the outcome in Dutch.
//!
//! # Architecture
//!
//! - [`kind`] - the metric classes and the requirements that bring them
//! - [`catalog`] - names, units, default targets and texts per class
//! - [`evaluate`] - status rules
//! - [`metric`] - measuring a class for a subject
//! - [`meta`] - percentages over the other metrics
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use chrono::Local;
//! use hq_metrics::{MetricContext, subject_metrics};
//! use hq_model::Project;
//! use hq_sources::SourceRegistry;
//!
//! let project = Project::load(Path::new("project.toml")).unwrap();
//! let sources = SourceRegistry::from_project(&project);
//! let context = MetricContext::new(&project, &sources, Local::now().naive_local());
//! for metric in subject_metrics(&project.subject, &context) {
//!     println!("{} {}", metric.status, metric.report);
//! }
//! ```

pub mod catalog;
pub mod context;
pub mod evaluate;
pub mod extra_info;
pub mod kind;
mod measure;
pub mod meta;
pub mod metric;
pub mod template;

pub use catalog::{DefaultTarget, Direction, MetricDefinition};
pub use context::MetricContext;
pub use extra_info::{Cell, ExtraInfo};
pub use kind::MetricKind;
pub use meta::meta_metrics;
pub use metric::{Metric, subject_metrics};
