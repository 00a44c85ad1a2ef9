//! Tracing setup for the `dictation` binary.
//!
//! Logs go to stderr so stdout carries nothing but the event stream.

use std::env;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Targets that make up our own logs.
const OUR_CRATES: &[&str] = &["dictation", "dk_core", "dk_protocol"];

/// Filter directive setting `level` for all of our crates.
pub fn level_spec_for(level: &str) -> String {
    let level = level.to_ascii_lowercase();
    OUR_CRATES
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Final filter spec: `--log-level`, then `RUST_LOG`, then `info`.
pub fn compute_spec(log_level: Option<&str>) -> String {
    if let Some(level) = log_level {
        return level_spec_for(level);
    }
    match env::var("RUST_LOG") {
        Ok(spec) if !spec.trim().is_empty() => spec,
        _ => level_spec_for("info"),
    }
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init(log_level: Option<&str>) {
    let spec = compute_spec(log_level);
    let filter = EnvFilter::try_new(&spec).unwrap_or_else(|_| EnvFilter::new(level_spec_for("info")));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_spec_covers_our_crates() {
        assert_eq!(
            level_spec_for("DEBUG"),
            "dictation=debug,dk_core=debug,dk_protocol=debug"
        );
    }

    #[test]
    fn test_explicit_level_wins() {
        assert_eq!(compute_spec(Some("trace")), level_spec_for("trace"));
    }
}
