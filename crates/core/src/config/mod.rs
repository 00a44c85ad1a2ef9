//! Configuration loading and management.
//!
//! This module provides functionality to load and parse the host's
//! `dictation.toml` configuration file.

pub mod error;
pub mod loader;
pub mod models;

pub use error::{ConfigError, ConfigResult};
pub use loader::load_config;
pub use models::{Defaults, HostConfig, PreferencesConfig, WorkerConfig};
