//! In-memory store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ConversationStore, StoreError};

/// Thread-safe in-memory store.
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_lifecycle() {
        let store = MemoryStore::new();
        assert!(store.is_empty().await);

        store.set("a", "[]").await.unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("[]"));

        store.set("a", "[1]").await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("[1]"));
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.set("k", "v").await.unwrap();
        assert_eq!(other.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
