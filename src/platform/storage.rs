//! String key-value storage
//!
//! Settings, high scores and player profiles are stored as JSON strings.
//! Writes report success so callers can log, but nothing here ever panics.

use std::collections::BTreeMap;

/// Minimal key-value store
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> bool;
    fn remove(&mut self, key: &str);
    fn keys(&self) -> Vec<String>;

    /// Decode a JSON value, treating corrupt data as absent
    fn get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T>
    where
        Self: Sized,
    {
        let json = self.get(key)?;
        match serde_json::from_str(&json) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Ignoring corrupt stored value for {}: {}", key, e);
                None
            }
        }
    }

    /// Encode and store a JSON value
    fn set_json<T: serde::Serialize>(&mut self, key: &str, value: &T) -> bool
    where
        Self: Sized,
    {
        match serde_json::to_string(value) {
            Ok(json) => self.set(key, &json),
            Err(e) => {
                log::warn!("Failed to encode {}: {}", key, e);
                false
            }
        }
    }
}

/// In-memory store (native builds and tests)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> bool {
        self.items.insert(key.to_string(), value.to_string());
        true
    }

    fn remove(&mut self, key: &str) {
        self.items.remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.items.keys().cloned().collect()
    }
}

/// Browser LocalStorage
#[cfg(target_arch = "wasm32")]
pub struct LocalStorage {
    storage: Option<web_sys::Storage>,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    pub fn new() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();
        if storage.is_none() {
            log::warn!("LocalStorage unavailable - nothing will be persisted");
        }
        Self { storage }
    }
}

#[cfg(target_arch = "wasm32")]
impl Default for LocalStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) -> bool {
        self.storage
            .as_ref()
            .map(|s| s.set_item(key, value).is_ok())
            .unwrap_or(false)
    }

    fn remove(&mut self, key: &str) {
        if let Some(storage) = &self.storage {
            let _ = storage.remove_item(key);
        }
    }

    fn keys(&self) -> Vec<String> {
        let Some(storage) = &self.storage else {
            return Vec::new();
        };
        let len = storage.length().unwrap_or(0);
        (0..len)
            .filter_map(|i| storage.key(i).ok().flatten())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        n: u32,
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert!(store.set_json("a", &Sample { n: 4 }));
        assert_eq!(store.get_json::<Sample>("a"), Some(Sample { n: 4 }));
        assert_eq!(store.keys(), vec!["a".to_string()]);
        store.remove("a");
        assert_eq!(store.get("a"), None);
    }

    #[test]
    fn test_corrupt_json_reads_as_absent() {
        let mut store = MemoryStore::new();
        store.set("a", "{broken");
        assert_eq!(store.get_json::<Sample>("a"), None);
    }
}
