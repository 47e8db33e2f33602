// ABOUTME: JSON snapshot persistence for the record set.
// ABOUTME: Loading is lenient (corruption means "no previous state"); saving replaces the file.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{info, warn};

use crate::error::SnapshotError;
use crate::models::Record;

/// Reads a snapshot, failing on unreadable or malformed files.
///
/// A missing file is an empty snapshot.
pub fn read_snapshot(path: &Path) -> Result<Vec<Record>, SnapshotError> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(SnapshotError::io(path, err)),
    };
    if data.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&data).map_err(|err| SnapshotError::json(path, err))
}

/// Reads a snapshot, treating any failure as "no previous state".
pub fn load_snapshot(path: &Path) -> Vec<Record> {
    match read_snapshot(path) {
        Ok(records) => records,
        Err(err) => {
            warn!(error = %err, "ignoring unusable snapshot");
            Vec::new()
        }
    }
}

/// Writes the full record set as pretty JSON, creating parent directories.
pub fn save_snapshot(path: &Path, records: &[Record]) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| SnapshotError::io(parent, err))?;
    }
    let mut json =
        serde_json::to_string_pretty(records).map_err(|err| SnapshotError::json(path, err))?;
    json.push('\n');
    fs::write(path, json).map_err(|err| SnapshotError::io(path, err))?;
    info!(path = %path.display(), count = records.len(), "snapshot saved");
    Ok(())
}
