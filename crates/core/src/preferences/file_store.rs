//! TOML-file-backed preference store.

use crate::preferences::error::PreferenceError;
use crate::preferences::store::{PreferenceKey, PreferenceStore};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Preferences persisted as a flat TOML table:
///
/// ```toml
/// hotkey = "Alt+Space"
/// language = "en"
/// model = "small.en"
/// ```
///
/// Every change rewrites the whole file through a temporary file in the
/// same directory, so a crash never leaves a half-written file behind.
pub struct FilePreferences {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FilePreferences {
    /// Open the store at `path`. Unreadable or malformed files are logged
    /// and treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match Self::load(&path) {
            Ok(values) => values,
            Err(e) => {
                warn!(error = %e, "ignoring stored preferences");
                BTreeMap::new()
            }
        };
        debug!(path = %path.display(), entries = values.len(), "preferences opened");

        Self {
            path,
            values: Mutex::new(values),
        }
    }

    /// Read the table at `path`. A missing file is an empty table.
    pub fn load(path: &Path) -> Result<BTreeMap<String, String>, PreferenceError> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = std::fs::read_to_string(path).map_err(|source| PreferenceError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| PreferenceError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<(), PreferenceError> {
        let write_error = |reason: String| PreferenceError::Write {
            path: self.path.clone(),
            reason,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| write_error(e.to_string()))?;

        let content = toml::to_string(values).map_err(|e| write_error(e.to_string()))?;
        let mut file = NamedTempFile::new_in(dir).map_err(|e| write_error(e.to_string()))?;
        file.write_all(content.as_bytes())
            .map_err(|e| write_error(e.to_string()))?;
        file.persist(&self.path)
            .map_err(|e| write_error(e.error.to_string()))?;
        Ok(())
    }

    fn update(&self, change: impl FnOnce(&mut BTreeMap<String, String>)) {
        let mut values = self.values.lock();
        change(&mut values);
        if let Err(e) = self.persist(&values) {
            warn!(error = %e, "preference kept in memory only");
        }
    }
}

impl PreferenceStore for FilePreferences {
    fn get(&self, key: PreferenceKey) -> Option<String> {
        self.values.lock().get(key.as_str()).cloned()
    }

    fn set(&self, key: PreferenceKey, value: &str) {
        self.update(|values| {
            values.insert(key.as_str().to_string(), value.to_string());
        });
    }

    fn delete(&self, key: PreferenceKey) {
        self.update(|values| {
            values.remove(key.as_str());
        });
    }
}
