//! Worker process lifecycle models.
//!
//! This module defines the structures the supervisor reports about the
//! single worker process it owns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// Lifecycle state of the supervised worker process.
///
/// The normal progression is:
/// NotStarted -> Starting -> Running -> Exited
///
/// Special states:
/// - SpawnFailed: the OS refused to create the process
///
/// Both Exited and SpawnFailed accept a new `start`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SupervisorState {
    /// No worker has been spawned yet.
    #[default]
    NotStarted,

    /// The worker is alive but has not yet reported a `started` session.
    Starting,

    /// The worker has reported `started` at least once.
    ///
    /// This stays set across later `stopped` events: it reflects the OS
    /// process, not the recording session.
    Running,

    /// The worker process terminated.
    Exited,

    /// Process creation failed.
    SpawnFailed,
}

impl SupervisorState {
    /// Whether a worker with an open input stream exists.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Starting | Self::Running)
    }

    /// Wire name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "NOT_STARTED",
            Self::Starting => "STARTING",
            Self::Running => "RUNNING",
            Self::Exited => "EXITED",
            Self::SpawnFailed => "SPAWN_FAILED",
        }
    }
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the worker process terminated.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct ExitInfo {
    /// Exit code, when the process exited normally.
    pub code: Option<i32>,

    /// Signal name (e.g. `SIGKILL`), when the process was killed.
    pub signal: Option<String>,
}

/// The most recent progress percentage scraped from the diagnostic stream.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct ProgressSnapshot {
    pub percent: u8,

    /// The trimmed text the percentage was found in.
    pub message: String,

    #[ts(type = "string")]
    pub observed_at: DateTime<Utc>,
}

/// Point-in-time readback of the supervisor.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct SupervisorStatus {
    pub state: SupervisorState,

    /// Last-known run state of the worker's session.
    pub running: bool,

    /// OS process id of the live worker, if any.
    pub pid: Option<u32>,

    pub last_progress: Option<ProgressSnapshot>,

    /// Set once the current worker generation has exited.
    pub last_exit: Option<ExitInfo>,
}
