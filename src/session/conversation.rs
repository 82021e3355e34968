//! The conversation session.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::intent::{Effect, Intent, Notice, ScrollTarget};
use crate::AppContext;
use crate::clipboard::ClipboardError;
use crate::completion::{CompletionError, GenerateRequest};
use crate::conversation::{ConversationId, History};
use crate::registry::RegistryAction;
use crate::store::{self, StoreError};

/// Notice shown after an export, whatever the clipboard outcome.
pub const EXPORT_NOTICE: &str = "Copied the conversation to the clipboard";

/// Why a submission did not append a new exchange.
#[derive(Error, Debug)]
pub enum SubmitError {
    /// Another submission is still running.
    #[error("A request is already in progress")]
    InFlight,

    /// The completion endpoint failed.
    #[error(transparent)]
    Completion(#[from] CompletionError),

    /// The reply was received but could not be persisted.
    #[error("Failed to save conversation: {0}")]
    Persist(#[from] StoreError),
}

impl SubmitError {
    /// Notice surfaced to the user, if any.
    ///
    /// A rejected submission is silent: the front-end already shows the
    /// submit action as disabled.
    #[must_use]
    pub fn notice(&self) -> Option<Notice> {
        match self {
            Self::InFlight => None,
            Self::Completion(e) => Some(Notice::error(e.user_message())),
            Self::Persist(_) => Some(Notice::error(self.to_string())),
        }
    }
}

/// Result of an export.
#[derive(Debug)]
pub struct ExportOutcome {
    /// The exported transcript.
    pub text: String,
    /// Outcome of the clipboard write.
    pub clipboard: Result<(), ClipboardError>,
}

/// Immutable snapshot of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub id: ConversationId,
    pub history: History,
    pub pending_input: String,
    pub submit_in_flight: bool,
}

#[derive(Debug)]
struct SessionData {
    id: ConversationId,
    history: History,
    pending_input: String,
}

/// State machine for the conversation on screen.
///
/// Clones share the same session.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    context: AppContext,
    data: RwLock<SessionData>,
    in_flight: AtomicBool,
}

/// Holds the submission gate; reopens it when dropped.
struct SubmitGate<'a>(&'a AtomicBool);

impl<'a> SubmitGate<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for SubmitGate<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ConversationSession {
    /// Create a session for `id` and load its stored history.
    pub async fn open(context: AppContext, id: ConversationId) -> Self {
        let history = store::load_history(context.store.as_ref(), &id).await;
        Self {
            inner: Arc::new(SessionInner {
                context,
                data: RwLock::new(SessionData {
                    id,
                    history,
                    pending_input: String::new(),
                }),
                in_flight: AtomicBool::new(false),
            }),
        }
    }

    /// Current state snapshot.
    pub async fn snapshot(&self) -> SessionState {
        let data = self.inner.data.read().await;
        SessionState {
            id: data.id.clone(),
            history: data.history.clone(),
            pending_input: data.pending_input.clone(),
            submit_in_flight: self.is_submitting(),
        }
    }

    /// Whether a submission is in flight.
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// Switch to `id` and load its stored history.
    ///
    /// Absent or malformed stored values load as an empty history. The
    /// pending input is kept.
    pub async fn load(&self, id: ConversationId) -> History {
        let history = store::load_history(self.inner.context.store.as_ref(), &id).await;
        let mut data = self.inner.data.write().await;
        data.id = id;
        data.history = history.clone();
        history
    }

    /// Replace the pending input.
    pub async fn set_input(&self, input: impl Into<String>) {
        self.inner.data.write().await.pending_input = input.into();
    }

    /// Send the pending input with the current history and temperature.
    ///
    /// On success the user/assistant exchange is appended, persisted under
    /// the session id, and the input is cleared. On failure history and
    /// input are left untouched. Empty input is sent as-is.
    pub async fn submit(&self) -> Result<History, SubmitError> {
        let Some(_gate) = SubmitGate::acquire(&self.inner.in_flight) else {
            return Err(SubmitError::InFlight);
        };

        let (id, request) = {
            let data = self.inner.data.read().await;
            (
                data.id.clone(),
                GenerateRequest {
                    input: data.pending_input.clone(),
                    history: data.history.clone(),
                    temperature: self.inner.context.registry.temperature(),
                },
            )
        };

        let reply = match self.inner.context.completion.generate(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(
                    name: "session.submit.failed",
                    conversation_id = %id,
                    error = %e,
                    "Completion request failed"
                );
                return Err(e.into());
            }
        };

        let new_history = request.history.with_exchange(request.input, reply);

        let still_active = {
            let mut data = self.inner.data.write().await;
            let still_active = data.id == id;
            if still_active {
                data.history = new_history.clone();
            }
            still_active
        };

        if let Err(e) =
            store::save_history(self.inner.context.store.as_ref(), &id, &new_history).await
        {
            error!(
                name: "session.persist.failed",
                conversation_id = %id,
                error = %e,
                "Failed to persist conversation"
            );
            return Err(e.into());
        }

        if still_active {
            self.inner.data.write().await.pending_input.clear();
        } else {
            warn!(
                name: "session.submit.detached",
                conversation_id = %id,
                "Conversation changed while request was in flight; reply saved only"
            );
        }

        info!(
            name: "session.submit.completed",
            conversation_id = %id,
            turns = new_history.len(),
            "Exchange appended"
        );
        Ok(new_history)
    }

    /// Build the transcript and copy it to the clipboard.
    pub async fn export(&self) -> ExportOutcome {
        let text = self.inner.data.read().await.history.export_text();
        let clipboard = self.inner.context.clipboard.write_text(&text).await;
        if let Err(e) = &clipboard {
            warn!(name: "session.export.clipboard_failed", error = %e, "Clipboard write failed");
        }
        ExportOutcome { text, clipboard }
    }

    /// Generate a new conversation id and record it in the registry.
    pub fn new_conversation(&self) -> ConversationId {
        let id = ConversationId::generate();
        self.inner.context.registry.apply(RegistryAction::Create {
            chat_id: id.clone(),
        });
        id
    }

    #[must_use]
    pub fn request_scroll_to_top(&self) -> Effect {
        Effect::Scroll(ScrollTarget::Top)
    }

    #[must_use]
    pub fn request_scroll_to_bottom(&self) -> Effect {
        Effect::Scroll(ScrollTarget::Bottom)
    }

    /// Apply an intent and return the effects to perform.
    pub async fn dispatch(&self, intent: Intent) -> Vec<Effect> {
        match intent {
            Intent::Load(id) => {
                self.load(id).await;
                vec![self.request_scroll_to_bottom()]
            }
            Intent::EditInput(input) => {
                self.set_input(input).await;
                Vec::new()
            }
            Intent::Submit => match self.submit().await {
                Ok(_) => vec![self.request_scroll_to_bottom()],
                Err(e) => e.notice().map(Effect::Notify).into_iter().collect(),
            },
            Intent::Export => {
                self.export().await;
                vec![Effect::Notify(Notice::info(EXPORT_NOTICE))]
            }
            Intent::ScrollToTop => vec![self.request_scroll_to_top()],
            Intent::ScrollToBottom => vec![self.request_scroll_to_bottom()],
            Intent::NewConversation => {
                let id = self.new_conversation();
                vec![Effect::Navigate(id.route())]
            }
        }
    }
}
