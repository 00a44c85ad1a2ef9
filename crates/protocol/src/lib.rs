//! # dk-protocol
//!
//! Wire protocol definitions and data models for dictation-kit.
//!
//! This crate defines all shared data structures used for:
//! - Commands written to the worker's standard input
//! - Events decoded from the worker's output and diagnostic streams
//! - Supervisor lifecycle state reported to the presentation layer
//!
//! ## Modules
//!
//! - [`ipc`]: Commands sent from the host to the worker
//! - [`event_models`]: Events flowing from the worker (and the host) to the UI
//! - [`process_models`]: Supervisor state, exit information and progress readback
//!
//! ## Design Principles
//!
//! - Minimal dependencies: Only serde, serde_json, chrono and ts-rs
//! - TypeScript generation: Types consumed by the shell derive `TS`
//! - Independent compilation: No dependencies on other dictation-kit crates

pub mod event_models;
pub mod ipc;
pub mod process_models;

// Re-export all public types for convenience
pub use event_models::*;
pub use ipc::*;
pub use process_models::*;
