//! Key-value settings persistence.
//!
//! The client keeps its settings as small JSON blobs under well-known keys.
//! `SettingsStore` abstracts the backing medium so the arbitration stack can
//! be tested without touching the filesystem.

use crate::error::ConfigError;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Blob store for persisted settings.
pub trait SettingsStore: Send + Sync {
    /// Fetch the raw JSON blob stored under `key`.
    fn get(&self, key: &str) -> Result<String, ConfigError>;

    /// Store a raw JSON blob under `key`, replacing any previous value.
    fn put(&self, key: &str, value: &str) -> Result<(), ConfigError>;
}

/// Load a typed value from the store, falling back to its default when the
/// key is absent or the blob fails to parse. Parse failures are logged and
/// swallowed so a corrupt blob can never take settings down with it.
pub fn load_or_default<T>(store: &dyn SettingsStore, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    match store.get(key) {
        Ok(raw) => match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Discarding corrupt settings under {:?}: {}", key, e);
                T::default()
            }
        },
        Err(ConfigError::MissingKey { .. }) => T::default(),
        Err(e) => {
            tracing::warn!("Failed to read settings under {:?}: {}", key, e);
            T::default()
        }
    }
}

/// Serialize and persist a typed value under `key`.
pub fn save<T>(store: &dyn SettingsStore, key: &str, value: &T) -> Result<(), ConfigError>
where
    T: Serialize,
{
    let raw = serde_json::to_string_pretty(value)?;
    store.put(key, &raw)
}

/// In-memory store used by tests and by hosts without a writable disk.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Result<String, ConfigError> {
        self.entries
            .lock()
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::MissingKey {
                key: key.to_string(),
            })
    }

    fn put(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// File-backed store: one JSON file per key inside a base directory.
pub struct JsonFileStore {
    base_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are fixed identifiers chosen by the application, not user
        // input, so a flat filename mapping is enough.
        self.base_dir.join(format!("{}.json", key))
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<String, ConfigError> {
        let path = self.path_for(key);
        if !Path::new(&path).exists() {
            return Err(ConfigError::MissingKey {
                key: key.to_string(),
            });
        }
        Ok(std::fs::read_to_string(path)?)
    }

    fn put(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}
