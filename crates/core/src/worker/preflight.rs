//! Pre-flight check for the worker program.
//!
//! A program that does not exist and a program the OS refuses to start are
//! different problems for the user, so the first is caught here before any
//! spawn is attempted.

use crate::config::models::WorkerConfig;
use std::path::{Path, PathBuf};

/// Result of the pre-flight check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    /// The program resolved to an executable file.
    Available { program: PathBuf },
    /// The program cannot be used; nothing should be spawned.
    Unavailable { reason: String },
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }
}

/// Check that the configured worker program can be executed.
///
/// Resolution:
/// 1. Empty program: unavailable
/// 2. A path (absolute, or containing a separator): must be an executable
///    file, relative paths resolved against `working_dir` when set
/// 3. A bare name: looked up on `PATH`
pub fn check_worker(config: &WorkerConfig) -> Availability {
    let program = config.program.trim();
    if program.is_empty() {
        return Availability::Unavailable {
            reason: "no worker program configured".to_string(),
        };
    }

    let path = Path::new(program);
    if path.is_absolute() || path.components().count() > 1 {
        let resolved = match (&config.working_dir, path.is_absolute()) {
            (Some(dir), false) => dir.join(path),
            _ => path.to_path_buf(),
        };
        return check_file(resolved);
    }

    match which::which(program) {
        Ok(program) => Availability::Available { program },
        Err(e) => Availability::Unavailable {
            reason: format!("'{program}' not found on PATH ({e})"),
        },
    }
}

fn check_file(path: PathBuf) -> Availability {
    let metadata = match std::fs::metadata(&path) {
        Ok(metadata) => metadata,
        Err(e) => {
            return Availability::Unavailable {
                reason: format!("{} does not exist ({e})", path.display()),
            }
        }
    };

    if !metadata.is_file() {
        return Availability::Unavailable {
            reason: format!("{} is not a file", path.display()),
        };
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Availability::Unavailable {
                reason: format!("{} is not executable", path.display()),
            };
        }
    }

    Availability::Available { program: path }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker(program: &str) -> WorkerConfig {
        WorkerConfig {
            program: program.to_string(),
            ..WorkerConfig::default()
        }
    }

    #[test]
    fn test_empty_program_is_unavailable() {
        assert!(!check_worker(&worker("  ")).is_available());
    }

    #[test]
    fn test_missing_absolute_path_is_unavailable() {
        let result = check_worker(&worker("/definitely/not/here/python3"));
        match result {
            Availability::Unavailable { reason } => assert!(reason.contains("does not exist")),
            other => panic!("Expected Unavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_bare_name_is_unavailable() {
        let result = check_worker(&worker("nonexistent-interpreter-xyz123"));
        match result {
            Availability::Unavailable { reason } => assert!(reason.contains("not found on PATH")),
            other => panic!("Expected Unavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_directory_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let result = check_worker(&worker(dir.path().to_str().unwrap()));
        assert!(!result.is_available());
    }

    #[cfg(unix)]
    #[test]
    fn test_executable_file_is_available() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("worker.sh");
        std::fs::write(&script, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(
            check_worker(&worker(script.to_str().unwrap())),
            Availability::Available { program: script }
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_non_executable_file_is_unavailable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("worker.sh");
        std::fs::write(&script, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o644)).unwrap();

        assert!(!check_worker(&worker(script.to_str().unwrap())).is_available());
    }

    #[cfg(unix)]
    #[test]
    fn test_relative_path_resolves_against_working_dir() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("bin")).unwrap();
        let script = dir.path().join("bin/worker");
        std::fs::write(&script, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let config = WorkerConfig {
            program: "bin/worker".to_string(),
            working_dir: Some(dir.path().to_path_buf()),
            ..WorkerConfig::default()
        };
        assert!(check_worker(&config).is_available());
    }

    #[test]
    fn test_sh_on_path_is_available() {
        assert!(check_worker(&worker("sh")).is_available());
    }
}
