//! Configuration file loader for `dictation.toml`.

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::models::HostConfig;
use std::path::Path;
use tracing::debug;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "dictation.toml";

/// Loads the host configuration from a TOML file.
///
/// # Arguments
///
/// * `path` - Path to the configuration file
///
/// # Returns
///
/// The parsed `HostConfig`. A missing file is not an error: the default
/// configuration is returned instead. Tables and fields left out of the file
/// take their default values.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - The file exists but cannot be read
/// - The file is not valid TOML, or contains unknown keys
/// - `worker.program` is empty
///
/// # Example
///
/// ```rust,no_run
/// use dk_core::config::load_config;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("dictation.toml"))?;
/// println!("Worker: {}", config.worker.program);
/// # Ok(())
/// # }
/// ```
pub fn load_config(path: &Path) -> ConfigResult<HostConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(HostConfig::default());
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let config: HostConfig = toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source,
    })?;

    validate(&config, path)?;

    debug!(path = %path.display(), program = %config.worker.program, "config loaded");
    Ok(config)
}

fn validate(config: &HostConfig, path: &Path) -> ConfigResult<()> {
    if config.worker.program.trim().is_empty() {
        return Err(ConfigError::InvalidConfig {
            path: path.to_path_buf(),
            reason: "worker.program must not be empty".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_load_config_full() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join(CONFIG_FILE_NAME);

        let config_toml = r#"
[worker]
program = "/opt/venv/bin/python"
args = ["-u", "-m", "whisper_dictation_core.server"]
working_dir = "/opt/dictation"
env = { HF_HOME = "/tmp/hf" }

[defaults]
model = "base.en"
language = "en"
hotkey = "Alt+Space"

[preferences]
path = "/tmp/prefs.toml"
"#;
        fs::write(&path, config_toml).expect("Failed to write config");

        let config = load_config(&path).expect("Failed to load config");

        assert_eq!(config.worker.program, "/opt/venv/bin/python");
        assert_eq!(config.worker.args.len(), 3);
        assert_eq!(config.worker.working_dir, Some(PathBuf::from("/opt/dictation")));
        assert_eq!(config.worker.env.get("HF_HOME").map(String::as_str), Some("/tmp/hf"));
        // An explicit env table replaces the default one
        assert!(!config.worker.env.contains_key("PYTHONUNBUFFERED"));
        assert_eq!(config.defaults.model, "base.en");
        assert_eq!(config.defaults.hotkey.as_deref(), Some("Alt+Space"));
        assert_eq!(config.preferences.path, Some(PathBuf::from("/tmp/prefs.toml")));
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let dir = tempdir().expect("Failed to create temp dir");
        let config = load_config(&dir.path().join(CONFIG_FILE_NAME))
            .expect("Should handle missing config file");

        assert_eq!(config, HostConfig::default());
    }

    #[test]
    fn test_load_config_partial() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[defaults]\nmodel = \"tiny\"\n").expect("Failed to write config");

        let config = load_config(&path).expect("Should handle partial config");

        assert_eq!(config.defaults.model, "tiny");
        assert_eq!(config.defaults.language.as_deref(), Some("en"));
        assert_eq!(config.worker.program, "python3");
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[worker\nprogram = ").expect("Failed to write config");

        let result = load_config(&path);
        assert!(matches!(result, Err(ConfigError::TomlParse { .. })));
    }

    #[test]
    fn test_load_config_unknown_key() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[worker]\nprogramme = \"python3\"\n").expect("Failed to write config");

        assert!(matches!(load_config(&path), Err(ConfigError::TomlParse { .. })));
    }

    #[test]
    fn test_load_config_empty_program() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[worker]\nprogram = \"\"\n").expect("Failed to write config");

        let result = load_config(&path);
        assert!(
            matches!(result, Err(ConfigError::InvalidConfig { ref reason, .. }) if reason.contains("worker.program"))
        );
    }
}
