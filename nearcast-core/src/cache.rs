//! Single-slot snapshot of the last successful fetch.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    fmt::Debug,
    fs,
    path::PathBuf,
    sync::Arc,
};

use crate::{error::WeatherError, model::WeatherRecord};

/// The one well-known key the snapshot lives under.
pub const SNAPSHOT_KEY: &str = "weather_response_data";

/// String-valued key/value storage in an application-private namespace.
pub trait KeyValueStore: Send + Sync + Debug {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// One file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", path.display()))?;
        Ok(Some(contents))
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create cache directory: {}", self.dir.display())
        })?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        fs::write(&tmp, value)
            .with_context(|| format!("Failed to write cache file: {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace cache file: {}", path.display()))?;

        Ok(())
    }
}

/// In-process store, mainly for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.lock().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.slots.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Typed access to the snapshot slot. Last write wins; no expiry.
#[derive(Debug, Clone)]
pub struct CacheStore {
    store: Arc<dyn KeyValueStore>,
}

impl CacheStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Overwrite the snapshot with `record`.
    pub fn put(&self, record: &WeatherRecord) -> Result<()> {
        let json = record.to_json().context("Failed to serialize weather snapshot")?;
        self.store.write(SNAPSHOT_KEY, &json)
    }

    /// Read the snapshot, distinguishing "never written" from "unreadable".
    pub fn load(&self) -> Result<Option<WeatherRecord>, WeatherError> {
        let raw = self
            .store
            .read(SNAPSHOT_KEY)
            .map_err(|e| WeatherError::CacheCorrupt(format!("{e:#}")))?;

        match raw {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => WeatherRecord::from_json(&s)
                .map(Some)
                .map_err(|e| WeatherError::CacheCorrupt(e.to_string())),
        }
    }

    /// Read the snapshot; anything unreadable counts as absent.
    pub fn get(&self) -> Option<WeatherRecord> {
        match self.load() {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable weather snapshot");
                None
            }
        }
    }
}
