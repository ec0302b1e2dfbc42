/// Key-value storage abstraction over the browser's localStorage
use crate::error::{Result, ShareError};
use serde_json::Value;
use std::collections::BTreeMap;

/// Exact prior content of a key, captured so a failed batch can put it back
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Value(Value),
    /// Text as the backend held it, which may not be JSON
    Raw(String),
}

/// Persistent key-value store holding JSON values
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: &Value) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;

    fn snapshot(&self, key: &str) -> Option<Snapshot> {
        self.get(key).map(Snapshot::Value)
    }

    fn restore(&mut self, key: &str, snapshot: &Snapshot) -> Result<()> {
        match snapshot {
            Snapshot::Value(value) => self.set(key, value),
            Snapshot::Raw(text) => self.set(key, &Value::String(text.clone())),
        }
    }
}

/// Write every `(key, value)` pair or none of them
///
/// Previous contents are captured with [`KeyValueStore::snapshot`] before the
/// first write. If any write fails, keys written so far are restored exactly
/// (or removed if they were absent) and the original error is returned.
pub fn write_all(store: &mut dyn KeyValueStore, writes: &[(&str, Value)]) -> Result<()> {
    let previous: Vec<(&str, Option<Snapshot>)> =
        writes.iter().map(|(key, _)| (*key, store.snapshot(key))).collect();

    for (written, (key, value)) in writes.iter().enumerate() {
        if let Err(e) = store.set(key, value) {
            log::warn!("Write to '{}' failed, rolling back {} key(s)", key, written);
            for (prev_key, prev_value) in previous.iter().take(written).rev() {
                let restored = match prev_value {
                    Some(snapshot) => store.restore(prev_key, snapshot),
                    None => store.remove(prev_key),
                };
                if let Err(rollback_err) = restored {
                    log::error!("Rollback of '{}' failed: {}", prev_key, rollback_err);
                }
            }
            return Err(e);
        }
    }

    Ok(())
}

/// In-memory store, used by tests and as a fallback when localStorage is blocked
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    entries: BTreeMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            entries: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &Value) -> Result<()> {
        self.entries.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// `window.localStorage`, values stored as JSON text
pub struct BrowserStore {
    storage: web_sys::Storage,
}

impl BrowserStore {
    pub fn local() -> Result<Self> {
        let unavailable = |detail: &str| ShareError::Storage {
            key: "*".to_string(),
            detail: detail.to_string(),
        };

        let window = web_sys::window().ok_or_else(|| unavailable("no window"))?;
        let storage = window
            .local_storage()
            .map_err(|e| unavailable(&format!("{:?}", e)))?
            .ok_or_else(|| unavailable("localStorage disabled"))?;

        Ok(BrowserStore { storage })
    }
}

impl BrowserStore {
    fn set_text(&mut self, key: &str, text: &str) -> Result<()> {
        self.storage
            .set_item(key, text)
            .map_err(|e| ShareError::Storage {
                key: key.to_string(),
                detail: format!("{:?}", e),
            })
    }
}

impl KeyValueStore for BrowserStore {
    fn get(&self, key: &str) -> Option<Value> {
        let raw = self.storage.get_item(key).ok()??;
        // Pages that wrote plain text (e.g. the context notes) are read back as strings
        Some(serde_json::from_str(&raw).unwrap_or(Value::String(raw)))
    }

    fn set(&mut self, key: &str, value: &Value) -> Result<()> {
        let text = serde_json::to_string(value)?;
        self.set_text(key, &text)
    }

    fn snapshot(&self, key: &str) -> Option<Snapshot> {
        self.storage.get_item(key).ok()?.map(Snapshot::Raw)
    }

    fn restore(&mut self, key: &str, snapshot: &Snapshot) -> Result<()> {
        match snapshot {
            Snapshot::Raw(text) => self.set_text(key, text),
            Snapshot::Value(value) => self.set(key, value),
        }
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.storage
            .remove_item(key)
            .map_err(|e| ShareError::Storage {
                key: key.to_string(),
                detail: format!("{:?}", e),
            })
    }
}
