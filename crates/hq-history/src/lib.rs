//! Measurement history of the quality dashboard.
//!
//! Every report run appends its date, the value and status of each metric,
//! and the number of metrics per status to one JSON file. The report uses
//! the history for sparklines, for the date since which a metric has its
//! current status, and for the meta metrics.

pub mod compact;
pub mod error;
pub mod io;

pub use compact::{CompactHistory, DATE_FORMAT, Measurement, MetricRecord, RECENT_HISTORY, StatusRecord};
pub use error::{HistoryError, Result};
pub use io::write_atomic;
