//! Quality report assembly and output.
//!
//! [`QualityReport::build`] measures every metric of a project and groups
//! them in sections. [`write_report`] writes the JSON documents and the
//! sparklines the dashboard front end reads.

pub mod error;
pub mod json;
pub mod report;
pub mod sparkline;
pub mod write;

pub use error::{ReportError, Result};
pub use json::{HQ_VERSION, meta_data_json, meta_history_json, metrics_json};
pub use report::{QualityReport, Section};
pub use write::{WrittenReport, write_report};
