//! State management for the worker process.
//!
//! This module provides:
//! - Shared run-state and progress cells read by the UI and hotkey handler
//! - Lifecycle bookkeeping for the single worker process
//! - The `ProcessSupervisor` that owns the process and its streams

pub(crate) mod lifecycle;
pub mod run_state;
pub mod supervisor;

pub use run_state::{LastProgress, RunState};
pub use supervisor::ProcessSupervisor;
