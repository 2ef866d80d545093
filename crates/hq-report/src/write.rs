//! Writing the report files to disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use hq_history::{CompactHistory, write_atomic};
use tracing::{debug, info};

use crate::error::{ReportError, Result};
use crate::json::{meta_data_json, meta_history_json, metrics_json};
use crate::report::QualityReport;
use crate::sparkline;

/// Files written by [`write_report`].
#[derive(Debug, Clone, Default)]
pub struct WrittenReport {
    pub json_files: Vec<PathBuf>,
    pub sparklines: usize,
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| ReportError::Io {
        operation: "create",
        path: path.to_path_buf(),
        source,
    })
}

/// Writes `json/metrics.json`, `json/meta_history.json`,
/// `json/meta_data.json` and one `img/{id}.svg` per metric below `dir`.
///
/// # Errors
///
/// Returns an error when a directory or file cannot be written.
pub fn write_report(
    report: &QualityReport,
    history: Option<&CompactHistory>,
    dir: &Path,
) -> Result<WrittenReport> {
    let start = Instant::now();
    let json_dir = dir.join("json");
    let img_dir = dir.join("img");
    create_dir(&json_dir)?;
    create_dir(&img_dir)?;

    let mut written = WrittenReport::default();
    for (name, contents) in [
        ("metrics.json", metrics_json(report)?),
        ("meta_history.json", meta_history_json(history)?),
        ("meta_data.json", meta_data_json(report)?),
    ] {
        let path = json_dir.join(name);
        write_atomic(&path, contents.as_bytes())?;
        debug!(path = %path.display(), "Wrote report file");
        written.json_files.push(path);
    }

    for metric in report.metrics() {
        let path = img_dir.join(format!("{}.svg", metric.normalized_stable_id()));
        write_atomic(&path, sparkline::render(metric)?.as_bytes())?;
        written.sparklines += 1;
    }

    info!(
        dir = %dir.display(),
        sparklines = written.sparklines,
        duration_ms = start.elapsed().as_millis(),
        "Wrote report"
    );
    Ok(written)
}
