//! Error types for preference persistence.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the file-backed preference store.
///
/// None of these are fatal: the store logs them and keeps serving its
/// in-memory values.
#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("Failed to read preferences at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse preferences at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to write preferences at {path}: {reason}")]
    Write { path: PathBuf, reason: String },
}
