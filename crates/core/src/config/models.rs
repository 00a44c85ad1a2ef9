//! Configuration models for the dictation host.
//!
//! `dictation.toml` has three optional tables:
//!
//! ```toml
//! [worker]
//! program = "python3"
//! args = ["-m", "whisper_dictation_core.server"]
//! working_dir = "."
//! env = { PYTHONUNBUFFERED = "1" }
//!
//! [defaults]
//! model = "small.en"
//! language = "en"
//! hotkey = "CommandOrControl+Alt+Space"
//!
//! [preferences]
//! path = "~/.config/dictation-kit/preferences.toml"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const DEFAULT_MODEL: &str = "small.en";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_HOTKEY: &str = "CommandOrControl+Alt+Space";

/// Unified host configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    pub worker: WorkerConfig,
    pub defaults: Defaults,
    pub preferences: PreferencesConfig,
}

/// How to launch the worker process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerConfig {
    /// Interpreter or executable. Bare names are looked up on `PATH`.
    pub program: String,

    pub args: Vec<String>,

    /// Working directory for the worker. Defaults to the host's own.
    pub working_dir: Option<PathBuf>,

    /// Extra environment variables.
    pub env: BTreeMap<String, String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        let mut env = BTreeMap::new();
        // Without this Python block-buffers stdout and events arrive late
        env.insert("PYTHONUNBUFFERED".to_string(), "1".to_string());

        Self {
            program: "python3".to_string(),
            args: vec!["-m".to_string(), "whisper_dictation_core.server".to_string()],
            working_dir: None,
            env,
        }
    }
}

/// Fallback values used when no preference has been stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Defaults {
    pub model: String,
    pub language: Option<String>,
    pub hotkey: Option<String>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            language: Some(DEFAULT_LANGUAGE.to_string()),
            hotkey: Some(DEFAULT_HOTKEY.to_string()),
        }
    }
}

/// Where preferences persist. `None` keeps them in memory only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreferencesConfig {
    pub path: Option<PathBuf>,
}

impl PreferencesConfig {
    /// The configured path with a leading `~` expanded from `HOME`.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.path.as_ref().map(|path| expand_home(path))
    }
}

fn expand_home(path: &std::path::Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}
