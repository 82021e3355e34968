//! Completion error types.

use serde_json::Value;
use thiserror::Error;

/// Why a completion request produced no reply.
#[derive(Error, Debug)]
pub enum CompletionError {
    /// The endpoint answered with a non-OK status.
    #[error("{}", request_message(.status, .error))]
    Request {
        /// HTTP status code.
        status: u16,
        /// Server-provided error payload, if any.
        error: Option<Value>,
    },

    /// Transport-level failure (connection refused, reset, timeout).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A `200` response whose body was not `{ "result": string }`.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The configured endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl CompletionError {
    /// Message shown to the user.
    ///
    /// Request failures surface the server payload itself; the other
    /// variants use their display text.
    #[must_use]
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

/// Coerce a server error payload into display text.
///
/// Strings are shown as-is, objects with a string `message` field show that
/// field, any other JSON value is shown as JSON. A missing payload falls back
/// to a generic status message.
#[allow(clippy::trivially_copy_pass_by_ref, clippy::ref_option)]
pub(crate) fn request_message(status: &u16, error: &Option<Value>) -> String {
    match error {
        Some(Value::String(message)) => message.clone(),
        Some(Value::Object(map)) => match map.get("message") {
            Some(Value::String(message)) => message.clone(),
            _ => Value::Object(map.clone()).to_string(),
        },
        Some(Value::Null) | None => format!("Request failed with status {status}"),
        Some(other) => other.to_string(),
    }
}
