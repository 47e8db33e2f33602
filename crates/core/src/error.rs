// ABOUTME: Error types for snapshot persistence, address reports and geocoding.
// ABOUTME: Extraction itself never errors; malformed input degrades to empty values instead.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or writing a record snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to access snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file exists but is not a JSON array of records.
    #[error("malformed snapshot {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl SnapshotError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SnapshotError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        SnapshotError::Json {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised by a geocoding collaborator.
///
/// "Not found" is not an error: lookups return `Ok(None)` for it.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// Network or decoding failure that survived every retry.
    #[error("transient geocoding failure: {0}")]
    Transient(String),

    /// The provider refused the request (bad key, quota, invalid request).
    #[error("geocoding request rejected: {0}")]
    Rejected(String),
}

impl GeocodeError {
    pub fn transient(err: impl fmt::Display) -> Self {
        GeocodeError::Transient(err.to_string())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        GeocodeError::Rejected(msg.into())
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, GeocodeError::Transient(_))
    }
}

/// Errors raised while writing CSV address reports.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}
