//! Conversation data model.
//!
//! A conversation is an ordered [`History`] of [`Turn`]s stored under a
//! [`ConversationId`]. Turns are appended in user/assistant pairs, so a
//! well-formed history always has even length.
//!
//! # Example
//!
//! ```rust
//! use mychatgpt::conversation::{History, Role};
//!
//! let history = History::new().with_exchange("hi", "hello");
//! assert_eq!(history.len(), 2);
//! assert_eq!(history.turns()[0].role, Role::User);
//! assert_eq!(history.export_text(), "Q1: hi\nA1: hello");
//! ```

mod id;
mod turn;

pub use id::ConversationId;
pub use turn::{History, Role, Turn};
