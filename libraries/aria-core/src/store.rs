//! In-memory key-value store
//!
//! Backs tests and embedded setups that have no durable substrate.

use crate::error::Result;
use crate::traits::KeyValueStore;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A [`KeyValueStore`] holding everything in a process-local map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no keys.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn save(&self, key: &str, value: serde_json::Value) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn save_load_delete_roundtrip() {
        let store = MemoryStore::new();
        store.save("volume", json!(0.7)).await.unwrap();

        assert_eq!(store.load("volume").await.unwrap(), Some(json!(0.7)));
        assert_eq!(store.load("missing").await.unwrap(), None);

        store.delete("volume").await.unwrap();
        assert_eq!(store.load("volume").await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn save_replaces_existing_value() {
        let store = MemoryStore::new();
        store.save("mode", json!("sequence")).await.unwrap();
        store.save("mode", json!("shuffle")).await.unwrap();

        assert_eq!(store.load("mode").await.unwrap(), Some(json!("shuffle")));
        assert_eq!(store.len().await, 1);
    }
}
