//! The compact history file.
//!
//! ```json
//! {
//!   "dates": ["2024-05-01 08:00:00", "2024-05-02 08:00:00"],
//!   "metrics": {
//!     "OpenBugsPortaal": [
//!       {"end": "2024-05-02 08:00:00", "start": "2024-05-01 08:00:00", "status": "green", "value": 12}
//!     ]
//!   },
//!   "statuses": [{"green": 1}, {"green": 1}]
//! }
//! ```
//!
//! A measurement covers the run dates from `start` up to `end`. A run that
//! measures the same value and status extends the last measurement instead
//! of adding one. Measurements without value were missing.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use hq_model::Status;
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, info};

use crate::error::{HistoryError, Result};
use crate::io::write_atomic;

/// Format of the dates in the history file.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Number of run dates used for recent history.
pub const RECENT_HISTORY: usize = 100;

/// A range of runs with the same value and status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub end: String,
    pub start: String,
    pub status: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_value"
    )]
    pub value: Option<f64>,
}

/// Integral values are written without fraction.
fn serialize_value<S: Serializer>(value: &Option<f64>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(value) if value.fract() == 0.0 && value.abs() < 9.0e15 => {
            serializer.serialize_i64(*value as i64)
        }
        Some(value) => serializer.serialize_f64(*value),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct HistoryFile {
    #[serde(default)]
    dates: Vec<String>,
    #[serde(default)]
    metrics: BTreeMap<String, Vec<Measurement>>,
    #[serde(default)]
    statuses: Vec<BTreeMap<String, u64>>,
}

/// The outcome of one metric in one run.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub stable_id: String,
    /// Numerical value, `None` when it could not be measured.
    pub value: Option<f64>,
    pub status: Status,
}

/// Status counts of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRecord {
    pub date: String,
    #[serde(flatten)]
    pub counts: BTreeMap<String, u64>,
}

/// Measurement history stored as one JSON document.
#[derive(Debug, Clone)]
pub struct CompactHistory {
    path: PathBuf,
    recent: usize,
    data: HistoryFile,
}

impl CompactHistory {
    /// An empty history that will be saved at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            recent: RECENT_HISTORY,
            data: HistoryFile::default(),
        }
    }

    /// Reads the history file. A missing file is an empty history.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No history file yet, starting an empty history");
                return Ok(Self::new(path));
            }
            Err(source) => {
                return Err(HistoryError::Io {
                    operation: "read",
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let data: HistoryFile =
            serde_json::from_str(&text).map_err(|source| HistoryError::InvalidFormat {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(
            path = %path.display(),
            dates = data.dates.len(),
            metrics = data.metrics.len(),
            "Read history"
        );
        Ok(Self {
            path: path.to_path_buf(),
            recent: RECENT_HISTORY,
            data,
        })
    }

    /// Limits recent history to the last `dates` run dates.
    #[must_use]
    pub fn with_recent(mut self, dates: usize) -> Self {
        self.recent = dates;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run dates, oldest first.
    pub fn dates(&self) -> &[String] {
        &self.data.dates
    }

    pub fn is_empty(&self) -> bool {
        self.data.dates.is_empty()
    }

    /// Values of the metric over the recent run dates, -1 for missing
    /// values. Dates before the first measurement are skipped.
    pub fn recent_history(&self, stable_id: &str) -> Vec<f64> {
        let Some(measurements) = self.data.metrics.get(stable_id) else {
            return Vec::new();
        };
        let skip = self.data.dates.len().saturating_sub(self.recent);
        self.data.dates[skip..]
            .iter()
            .filter_map(|date| {
                measurements
                    .iter()
                    .rev()
                    .find(|measurement| {
                        measurement.start.as_str() <= date.as_str() && date.as_str() <= measurement.end.as_str()
                    })
                    .map(|measurement| measurement.value.unwrap_or(-1.0))
            })
            .collect()
    }

    /// Since when the metric has had `status`; `now` when the last recorded
    /// status differs or the metric is new.
    pub fn status_start_date(&self, stable_id: &str, status: Status, now: NaiveDateTime) -> NaiveDateTime {
        self.data
            .metrics
            .get(stable_id)
            .and_then(|measurements| measurements.last())
            .filter(|last| last.status == status.as_str())
            .and_then(|last| NaiveDateTime::parse_from_str(&last.start, DATE_FORMAT).ok())
            .unwrap_or(now)
    }

    /// Status counts per run date.
    pub fn statuses(&self) -> Vec<StatusRecord> {
        self.data
            .dates
            .iter()
            .zip(&self.data.statuses)
            .map(|(date, counts)| StatusRecord {
                date: date.clone(),
                counts: counts.clone(),
            })
            .collect()
    }

    /// Records a run.
    pub fn add_metrics(&mut self, date: NaiveDateTime, records: impl IntoIterator<Item = MetricRecord>) {
        let date = date.format(DATE_FORMAT).to_string();
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        let mut recorded = 0;
        for record in records {
            let status = record.status.as_str();
            let measurements = self.data.metrics.entry(record.stable_id).or_default();
            match measurements.last_mut() {
                Some(last)
                    if last.value.unwrap_or(-1.0) == record.value.unwrap_or(-1.0)
                        && last.status == status =>
                {
                    last.end.clone_from(&date);
                }
                _ => measurements.push(Measurement {
                    end: date.clone(),
                    start: date.clone(),
                    status: status.to_string(),
                    value: record.value.filter(|value| *value != -1.0),
                }),
            }
            *counts.entry(status.to_string()).or_default() += 1;
            recorded += 1;
        }
        debug!(%date, metrics = recorded, "Added run to history");
        self.data.dates.push(date);
        self.data.statuses.push(counts);
    }

    /// Writes the history with sorted keys and an indent of two spaces.
    pub fn save(&self) -> Result<()> {
        let mut bytes = serde_json::to_vec_pretty(&self.data)
            .map_err(|source| HistoryError::Serialization { source })?;
        bytes.push(b'\n');
        write_atomic(&self.path, &bytes)?;
        info!(path = %self.path.display(), dates = self.data.dates.len(), "Saved history");
        Ok(())
    }
}
