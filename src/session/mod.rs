//! Conversation session state machine.
//!
//! A [`ConversationSession`] owns the state of the conversation currently on
//! screen: its id, history, the text being typed, and the submission gate.
//! User actions arrive as [`Intent`]s; each dispatch returns the [`Effect`]s
//! the front-end must carry out (notifications, scrolling, navigation), and
//! the new [`SessionState`] snapshot is available through
//! [`ConversationSession::snapshot`].
//!
//! # Submission gate
//!
//! ```text
//! Idle --submit--> InFlight --(reply | error)--> Idle
//! ```
//!
//! Only one completion request runs per session. The gate is released on
//! every exit path.
//!
//! # Example
//!
//! ```rust,no_run
//! use mychatgpt::AppContext;
//! use mychatgpt::conversation::ConversationId;
//! use mychatgpt::session::{ConversationSession, Intent};
//!
//! # async fn example(context: AppContext) {
//! let session = ConversationSession::open(context, ConversationId::new("chat-1")).await;
//! session.dispatch(Intent::EditInput("Hello!".into())).await;
//! let effects = session.dispatch(Intent::Submit).await;
//! let state = session.snapshot().await;
//! # }
//! ```

mod conversation;
mod intent;

pub use conversation::{ConversationSession, ExportOutcome, SessionState, SubmitError};
pub use intent::{Effect, Intent, Notice, NoticeLevel, ScrollTarget};
