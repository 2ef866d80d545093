//! Atomic file writes.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::error::{HistoryError, Result};

/// Writes `bytes` to `path` through a temp file and a rename, creating the
/// parent directory when needed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let extension = path
        .extension()
        .map(|extension| format!("{}.tmp", extension.to_string_lossy()))
        .unwrap_or_else(|| "tmp".to_string());
    let temp_path = path.with_extension(extension);

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| HistoryError::Io {
            operation: "create directory",
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let mut file = File::create(&temp_path).map_err(|e| HistoryError::Io {
        operation: "create",
        path: temp_path.clone(),
        source: e,
    })?;

    file.write_all(bytes).map_err(|e| HistoryError::Io {
        operation: "write",
        path: temp_path.clone(),
        source: e,
    })?;

    file.sync_all().map_err(|e| HistoryError::Io {
        operation: "sync",
        path: temp_path.clone(),
        source: e,
    })?;

    fs::rename(&temp_path, path).map_err(|e| HistoryError::AtomicWriteFailed {
        temp_path: temp_path.clone(),
        target_path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_file_and_leaves_no_temp_file() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("history.json");

        write_atomic(&path, b"{}").expect("write");
        write_atomic(&path, b"{\"dates\": []}").expect("overwrite");

        assert_eq!(fs::read_to_string(&path).expect("read"), "{\"dates\": []}");
        assert!(!path.with_extension("json.tmp").exists());
    }
}
