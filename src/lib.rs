//! Conversation session for a single chat page.
//!
//! Loads a conversation's history, sends new prompts to a completion
//! endpoint, appends the reply, and persists the result. Auxiliary actions
//! cover transcript export, scroll requests and new-chat creation.
//!
//! # Architecture
//!
//! - **Session**: intent-driven state machine with a single-flight submission gate
//! - **Completion**: HTTP client for `POST /api/generate`
//! - **Store**: key-value persistence of JSON turn arrays
//! - **Registry**: shared context holding temperature and known conversations
//!
//! # Modules
//!
//! - [`conversation`]: turns, history and identifiers
//! - [`completion`]: completion service trait and HTTP client
//! - [`store`]: conversation store trait and providers
//! - [`clipboard`]: clipboard adapters
//! - [`registry`]: conversation registry
//! - [`session`]: conversation session, intents and effects
//! - [`render`]: plain-text rendering of session snapshots

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod clipboard;
pub mod completion;
pub mod config;
pub mod conversation;
pub mod registry;
pub mod render;
pub mod session;
pub mod store;

use std::sync::Arc;

use crate::clipboard::{Clipboard, CommandClipboard, NoClipboard};
use crate::completion::{CompletionError, CompletionService, HttpCompletionService};
use crate::config::{AppConfig, StorageProvider};
use crate::registry::ConversationRegistry;
use crate::store::{ConversationStore, FileStore, MemoryStore, StoreError};

/// Collaborators shared by every session.
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Generates assistant replies.
    pub completion: Arc<dyn CompletionService>,
    /// Persists conversation histories.
    pub store: Arc<dyn ConversationStore>,
    /// Receives exported transcripts.
    pub clipboard: Arc<dyn Clipboard>,
    /// Temperature and known conversations.
    pub registry: ConversationRegistry,
}

/// Error building an [`AppContext`] from configuration.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppContext {
    /// Build the context described by `config`.
    ///
    /// Conversations already present in a file store are registered.
    pub async fn from_config(config: &AppConfig) -> Result<Self, ContextError> {
        let completion = match config.api.timeout() {
            Some(timeout) => HttpCompletionService::with_timeout(&config.api.base_url, timeout)?,
            None => HttpCompletionService::new(&config.api.base_url)?,
        };

        let registry = ConversationRegistry::new(config.chat.temperature);

        let store: Arc<dyn ConversationStore> = match config.storage.provider {
            StorageProvider::File => {
                let store = FileStore::open(&config.storage.dir).await?;
                for key in store.keys().await? {
                    registry.register(key.into(), chrono::Utc::now());
                }
                Arc::new(store)
            }
            StorageProvider::Memory => Arc::new(MemoryStore::new()),
        };

        let clipboard: Arc<dyn Clipboard> = match &config.clipboard.command {
            Some(command) => Arc::new(CommandClipboard::new(
                command.clone(),
                config.clipboard.args.clone(),
            )),
            None => Arc::new(NoClipboard),
        };

        Ok(Self {
            completion: Arc::new(completion),
            store,
            clipboard,
            registry,
        })
    }
}
