//! Intents consumed by a session and effects it emits.

use std::fmt;

use crate::conversation::ConversationId;

/// A user action.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// The active conversation changed (route parameter became available).
    Load(ConversationId),
    /// The input box content changed.
    EditInput(String),
    /// Send the pending input to the completion endpoint.
    Submit,
    /// Copy the transcript to the clipboard.
    Export,
    ScrollToTop,
    ScrollToBottom,
    /// Start a fresh conversation.
    NewConversation,
}

/// Scroll destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTarget {
    /// First rendered element.
    Top,
    /// Last rendered element.
    Bottom,
}

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A blocking message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Side effect the front-end must perform after a dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Smooth-scroll the transcript.
    Scroll(ScrollTarget),
    /// Show a notice and wait for the user to acknowledge it.
    Notify(Notice),
    /// Route to the given path.
    Navigate(String),
}
