//! Plain-text rendering of a session snapshot.
//!
//! Rendering is a pure function of [`SessionState`]; the terminal front-end
//! prints its output and decides which part to show for scroll requests.

use crate::session::SessionState;

/// Rendered transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Transcript lines, oldest first.
    pub lines: Vec<String>,
    /// Status line under the transcript.
    pub status: String,
}

impl Frame {
    /// The first `height` lines.
    #[must_use]
    pub fn top(&self, height: usize) -> &[String] {
        &self.lines[..height.min(self.lines.len())]
    }

    /// The last `height` lines.
    #[must_use]
    pub fn bottom(&self, height: usize) -> &[String] {
        &self.lines[self.lines.len().saturating_sub(height)..]
    }
}

/// Render the conversation as user/assistant blocks.
#[must_use]
pub fn render(state: &SessionState) -> Frame {
    let mut lines = Vec::new();

    for (index, (user, assistant)) in state.history.exchanges().enumerate() {
        if index > 0 {
            lines.push(String::new());
        }
        lines.push(format!("[{}] you", index + 1));
        lines.extend(user.content.lines().map(|l| format!("  {l}")));
        lines.push(format!("[{}] assistant", index + 1));
        lines.extend(assistant.content.lines().map(|l| format!("  | {l}")));
    }

    let status = if state.submit_in_flight {
        format!("{} | waiting for reply...", state.id)
    } else {
        format!("{} | {} exchanges", state.id, state.history.exchange_count())
    };

    Frame { lines, status }
}
