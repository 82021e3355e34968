//! Application-wide conversation registry.
//!
//! The registry is the explicit shared context handed to every
//! [`ConversationSession`](crate::session::ConversationSession): it owns the
//! sampling temperature and the list of known conversations. It is created
//! once at startup and lives for the rest of the process.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::conversation::ConversationId;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.6;

/// Accepted temperature range.
pub const TEMPERATURE_RANGE: std::ops::RangeInclusive<f32> = 0.0..=2.0;

/// Changes that can be applied to the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryAction {
    /// A new conversation was started.
    Create { chat_id: ConversationId },
    /// The sampling temperature changed.
    SetTemperature { value: f32 },
}

/// A known conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationEntry {
    pub id: ConversationId,
    pub created_at: DateTime<Utc>,
}

/// Thread-safe registry. Clones share state.
#[derive(Debug, Clone)]
pub struct ConversationRegistry {
    inner: Arc<RegistryInner>,
}

#[derive(Debug)]
struct RegistryInner {
    temperature: RwLock<f32>,
    conversations: RwLock<HashMap<ConversationId, DateTime<Utc>>>,
}

impl Default for ConversationRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPERATURE)
    }
}

impl ConversationRegistry {
    /// Create a registry with the given initial temperature.
    #[must_use]
    pub fn new(temperature: f32) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                temperature: RwLock::new(clamp_temperature(temperature)),
                conversations: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Apply an action.
    pub fn apply(&self, action: RegistryAction) {
        match action {
            RegistryAction::Create { chat_id } => {
                let mut guard = self.inner.conversations.write().unwrap();
                guard.entry(chat_id.clone()).or_insert_with(Utc::now);
                drop(guard);
                info!(name: "registry.conversation.created", conversation_id = %chat_id, "Conversation created");
            }
            RegistryAction::SetTemperature { value } => {
                *self.inner.temperature.write().unwrap() = clamp_temperature(value);
            }
        }
    }

    /// Record an existing conversation (e.g. one found on disk) without a
    /// creation log line.
    pub fn register(&self, id: ConversationId, created_at: DateTime<Utc>) {
        self.inner
            .conversations
            .write()
            .unwrap()
            .entry(id)
            .or_insert(created_at);
    }

    /// Current sampling temperature.
    #[must_use]
    pub fn temperature(&self) -> f32 {
        *self.inner.temperature.read().unwrap()
    }

    pub fn set_temperature(&self, value: f32) {
        self.apply(RegistryAction::SetTemperature { value });
    }

    #[must_use]
    pub fn contains(&self, id: &ConversationId) -> bool {
        self.inner.conversations.read().unwrap().contains_key(id)
    }

    /// Known conversations, oldest first.
    #[must_use]
    pub fn list(&self) -> Vec<ConversationEntry> {
        let mut entries: Vec<ConversationEntry> = self
            .inner
            .conversations
            .read()
            .unwrap()
            .iter()
            .map(|(id, created_at)| ConversationEntry {
                id: id.clone(),
                created_at: *created_at,
            })
            .collect();
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.conversations.read().unwrap().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn clamp_temperature(value: f32) -> f32 {
    if value.is_nan() {
        DEFAULT_TEMPERATURE
    } else {
        value.clamp(*TEMPERATURE_RANGE.start(), *TEMPERATURE_RANGE.end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_registers_conversation() {
        let registry = ConversationRegistry::default();
        assert!(registry.is_empty());

        let id = ConversationId::generate();
        registry.apply(RegistryAction::Create {
            chat_id: id.clone(),
        });
        assert!(registry.contains(&id));
        assert_eq!(registry.len(), 1);
        assert!(!registry.contains(&ConversationId::new("other")));
    }

    #[test]
    fn test_create_is_idempotent() {
        let registry = ConversationRegistry::default();
        let id = ConversationId::new("same");
        registry.apply(RegistryAction::Create {
            chat_id: id.clone(),
        });
        let first = registry.list()[0].created_at;
        registry.apply(RegistryAction::Create { chat_id: id });
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.list()[0].created_at, first);
    }

    #[test]
    fn test_list_is_oldest_first() {
        let registry = ConversationRegistry::default();
        let older = Utc::now() - chrono::Duration::hours(1);
        registry.register(ConversationId::new("new"), Utc::now());
        registry.register(ConversationId::new("old"), older);

        let ids: Vec<_> = registry.list().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![ConversationId::new("old"), ConversationId::new("new")]);
    }

    #[test]
    fn test_temperature_is_clamped() {
        let registry = ConversationRegistry::new(0.2);
        assert!((registry.temperature() - 0.2).abs() < f32::EPSILON);

        registry.set_temperature(5.0);
        assert!((registry.temperature() - 2.0).abs() < f32::EPSILON);

        registry.set_temperature(-1.0);
        assert!(registry.temperature().abs() < f32::EPSILON);

        registry.set_temperature(f32::NAN);
        assert!((registry.temperature() - DEFAULT_TEMPERATURE).abs() < f32::EPSILON);
    }

    #[test]
    fn test_clones_share_state() {
        let registry = ConversationRegistry::default();
        let other = registry.clone();
        other.set_temperature(1.0);
        assert!((registry.temperature() - 1.0).abs() < f32::EPSILON);
    }
}
