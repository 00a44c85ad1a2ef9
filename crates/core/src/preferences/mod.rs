//! Persisted user preferences: model, language and hotkey.
//!
//! A missing or broken preference file never stops the host. Stores degrade
//! to in-memory behaviour and log a warning.

pub mod error;
pub mod file_store;
pub mod store;

pub use error::PreferenceError;
pub use file_store::FilePreferences;
pub use store::{
    open_store, EffectivePreferences, MemoryPreferences, PreferenceKey, PreferenceStore,
};
