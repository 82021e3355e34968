//! Turns and conversation history.

use serde::{Deserialize, Serialize};

/// Speaker of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Text typed by the user.
    User,
    /// Text generated by the completion endpoint.
    Assistant,
}

impl Role {
    /// Prefix used by the plain-text export (`Q` for questions, `A` for answers).
    #[must_use]
    pub fn export_prefix(self) -> char {
        match self {
            Self::User => 'Q',
            Self::Assistant => 'A',
        }
    }
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered, chronological sequence of turns.
///
/// A history is never mutated in place by the session: appending an
/// exchange produces a new value that replaces the old one in a single
/// assignment. Serializes as a bare JSON array of turns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History(Vec<Turn>);

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of complete user/assistant exchanges.
    #[must_use]
    pub fn exchange_count(&self) -> usize {
        self.0.len() / 2
    }

    /// Iterate over `(user, assistant)` pairs. A trailing unpaired turn is skipped.
    pub fn exchanges(&self) -> impl Iterator<Item = (&Turn, &Turn)> {
        self.0.chunks_exact(2).map(|pair| (&pair[0], &pair[1]))
    }

    /// Return a new history with the user input and the assistant reply appended.
    #[must_use]
    pub fn with_exchange(&self, input: impl Into<String>, reply: impl Into<String>) -> Self {
        let mut turns = Vec::with_capacity(self.0.len() + 2);
        turns.extend(self.0.iter().cloned());
        turns.push(Turn::user(input));
        turns.push(Turn::assistant(reply));
        Self(turns)
    }

    /// Plain-text transcript: `Q{n}: ...` / `A{n}: ...` lines, `n` starting at 1.
    #[must_use]
    pub fn export_text(&self) -> String {
        self.0
            .iter()
            .enumerate()
            .map(|(index, turn)| {
                format!(
                    "{}{}: {}",
                    turn.role.export_prefix(),
                    index / 2 + 1,
                    turn.content
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<Vec<Turn>> for History {
    fn from(turns: Vec<Turn>) -> Self {
        Self(turns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_exchange_appends_pair_in_order() {
        let history = History::new();
        let next = history.with_exchange("hi", "hello");

        assert!(history.is_empty());
        assert_eq!(next.len(), 2);
        assert_eq!(next.turns()[0], Turn::user("hi"));
        assert_eq!(next.turns()[1], Turn::assistant("hello"));
    }

    #[test]
    fn test_export_text_numbers_pairs_from_one() {
        let history = History::new()
            .with_exchange("first?", "one")
            .with_exchange("second?", "two")
            .with_exchange("third?", "three");

        let text = history.export_text();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "Q1: first?");
        assert_eq!(lines[1], "A1: one");
        assert_eq!(lines[4], "Q3: third?");
        assert_eq!(lines[5], "A3: three");
    }

    #[test]
    fn test_export_text_empty() {
        assert_eq!(History::new().export_text(), "");
    }

    #[test]
    fn test_export_keeps_multiline_content() {
        let history = History::new().with_exchange("a\nb", "c");
        assert_eq!(history.export_text(), "Q1: a\nb\nA1: c");
    }

    #[test]
    fn test_json_shape() {
        let history = History::new().with_exchange("hi", "hello");
        let json = serde_json::to_string(&history).unwrap();
        assert_eq!(
            json,
            r#"[{"role":"user","content":"hi"},{"role":"assistant","content":"hello"}]"#
        );

        let parsed: History = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, history);
    }

    #[test]
    fn test_exchanges_skip_trailing_turn() {
        let history = History::from(vec![
            Turn::user("q"),
            Turn::assistant("a"),
            Turn::user("dangling"),
        ]);
        assert_eq!(history.exchange_count(), 1);
        assert_eq!(history.exchanges().count(), 1);
    }
}
