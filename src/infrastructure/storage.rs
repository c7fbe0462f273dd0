use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use parking_lot::Mutex;

/// String key/value state shared by the pipeline: submission history, the
/// block timestamp and the CSRF token record all live behind this seam.
///
/// Reads and writes are last-write-wins; there is no transactional guarantee
/// across keys.
pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Session-scoped store. Contents die with the process.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.lock().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.lock().remove(key);
    }
}

/// Durable store backed by a single JSON object file. Survives process
/// restarts. A missing or corrupt file is treated as empty state rather than
/// an error; a write failure keeps the in-memory value and logs.
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        let entries = match Self::load(&path) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!("state file {} unreadable, starting empty: {err:#}", path.display());
                HashMap::new()
            }
        };

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn load(path: &PathBuf) -> anyhow::Result<HashMap<String, String>> {
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading state file {}", path.display()))?;
        let entries = serde_json::from_str(&raw)
            .with_context(|| format!("parsing state file {}", path.display()))?;
        Ok(entries)
    }

    fn persist(&self, entries: &HashMap<String, String>) {
        let serialized = match serde_json::to_string_pretty(entries) {
            Ok(serialized) => serialized,
            Err(err) => {
                tracing::error!("failed to serialize state: {err}");
                return;
            }
        };
        if let Err(err) = fs::write(&self.path, serialized) {
            tracing::error!("failed to write state file {}: {err}", self.path.display());
        }
    }
}

impl StateStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries);
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock();
        entries.remove(key);
        self.persist(&entries);
    }
}
