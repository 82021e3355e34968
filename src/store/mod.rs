//! Conversation persistence.
//!
//! A [`ConversationStore`] is a durable string key-value store: the key is
//! the conversation id and the value is the JSON-encoded turn array. Reading
//! history through [`load_history`] never fails; an absent key or a value
//! that does not parse yields an empty history.
//!
//! # Providers
//!
//! - [`MemoryStore`]: process-local map, used by tests and ephemeral runs
//! - [`FileStore`]: one `<id>.json` file per conversation in a directory

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::conversation::{ConversationId, History};

/// Storage error type.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying I/O failed.
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// History could not be encoded.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The key cannot be used by this provider.
    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// Durable key-value persistence for raw conversation values.
#[async_trait]
pub trait ConversationStore: Send + Sync + std::fmt::Debug {
    /// Read the raw value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrite the value stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Load the history stored for `id`, falling back to an empty history.
pub async fn load_history(store: &dyn ConversationStore, id: &ConversationId) -> History {
    let raw = match store.get(id.as_str()).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return History::new(),
        Err(e) => {
            warn!(
                name: "store.read.failed",
                conversation_id = %id,
                error = %e,
                "Failed to read stored history"
            );
            return History::new();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(history) => history,
        Err(e) => {
            warn!(
                name: "store.history.malformed",
                conversation_id = %id,
                error = %e,
                "Stored history is not valid JSON, starting empty"
            );
            History::new()
        }
    }
}

/// Persist `history` under `id` as a JSON array.
pub async fn save_history(
    store: &dyn ConversationStore,
    id: &ConversationId,
    history: &History,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(history)?;
    store.set(id.as_str(), &raw).await
}
