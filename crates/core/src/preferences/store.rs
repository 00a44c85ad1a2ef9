use crate::config::models::{Defaults, PreferencesConfig};
use crate::preferences::file_store::FilePreferences;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// The keys the host stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreferenceKey {
    Model,
    Language,
    Hotkey,
}

impl PreferenceKey {
    pub const ALL: [PreferenceKey; 3] = [Self::Model, Self::Language, Self::Hotkey];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Language => "language",
            Self::Hotkey => "hotkey",
        }
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key-value preference storage.
///
/// Infallible at this boundary: implementations that persist report their
/// own failures through logging and keep the in-memory value.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: PreferenceKey) -> Option<String>;
    fn set(&self, key: PreferenceKey, value: &str);
    fn delete(&self, key: PreferenceKey);
}

/// Preferences held for the lifetime of the process only.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<BTreeMap<PreferenceKey, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: PreferenceKey) -> Option<String> {
        self.values.lock().get(&key).cloned()
    }

    fn set(&self, key: PreferenceKey, value: &str) {
        self.values.lock().insert(key, value.to_string());
    }

    fn delete(&self, key: PreferenceKey) {
        self.values.lock().remove(&key);
    }
}

/// Open the store described by `config`: file-backed when a path is
/// configured, in-memory otherwise.
pub fn open_store(config: &PreferencesConfig) -> Arc<dyn PreferenceStore> {
    match config.resolved_path() {
        Some(path) => Arc::new(FilePreferences::open(path)),
        None => {
            debug!("no preference path configured, keeping preferences in memory");
            Arc::new(MemoryPreferences::new())
        }
    }
}

/// Values in effect: the stored preference, else the configured default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectivePreferences {
    pub model: String,
    pub language: Option<String>,
    pub hotkey: Option<String>,
}

impl EffectivePreferences {
    pub fn resolve(store: &dyn PreferenceStore, defaults: &Defaults) -> Self {
        Self {
            model: store
                .get(PreferenceKey::Model)
                .unwrap_or_else(|| defaults.model.clone()),
            language: store
                .get(PreferenceKey::Language)
                .or_else(|| defaults.language.clone()),
            hotkey: store
                .get(PreferenceKey::Hotkey)
                .or_else(|| defaults.hotkey.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let store = MemoryPreferences::new();
        assert_eq!(store.get(PreferenceKey::Model), None);

        store.set(PreferenceKey::Model, "base.en");
        store.set(PreferenceKey::Model, "tiny");
        assert_eq!(store.get(PreferenceKey::Model).as_deref(), Some("tiny"));

        store.delete(PreferenceKey::Model);
        store.delete(PreferenceKey::Model);
        assert_eq!(store.get(PreferenceKey::Model), None);
    }

    #[test]
    fn test_resolve_prefers_stored_values() {
        let store = MemoryPreferences::new();
        store.set(PreferenceKey::Language, "de");
        let defaults = Defaults::default();

        let effective = EffectivePreferences::resolve(&store, &defaults);

        assert_eq!(effective.model, defaults.model);
        assert_eq!(effective.language.as_deref(), Some("de"));
        assert_eq!(effective.hotkey, defaults.hotkey);
    }

    #[test]
    fn test_open_store_without_path_is_memory() {
        let store = open_store(&PreferencesConfig::default());
        store.set(PreferenceKey::Hotkey, "F9");
        assert_eq!(store.get(PreferenceKey::Hotkey).as_deref(), Some("F9"));
    }

    #[test]
    fn test_key_names() {
        let names: Vec<_> = PreferenceKey::ALL.iter().map(PreferenceKey::as_str).collect();
        assert_eq!(names, ["model", "language", "hotkey"]);
    }
}
