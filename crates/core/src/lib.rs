//! # dk-core
//!
//! Worker supervision and event protocol for dictation-kit.
//!
//! This crate provides:
//! - Encoding of commands and decoding of worker output into events
//! - Progress scraping from the worker's unstructured diagnostic stream
//! - Lifecycle supervision of the single worker process
//! - A global-hotkey toggle that follows the worker's reported run state
//! - Host configuration and persisted preferences
//!
//! ## Modules
//!
//! - [`worker`]: Codec, progress scraper, dispatcher and pre-flight check
//! - [`state`]: Run state cells and the process supervisor
//! - [`hotkey`]: Accelerator parsing, registrar seam and the toggle controller
//! - [`config`]: Configuration loading from `dictation.toml`
//! - [`preferences`]: Key-value preference storage

pub mod config;
pub mod hotkey;
pub mod preferences;
pub mod state;
pub mod worker;
