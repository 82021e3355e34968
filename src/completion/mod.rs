//! Completion endpoint client.
//!
//! The [`CompletionService`] trait is the seam between the conversation
//! session and the backend that generates assistant replies. The
//! [`HttpCompletionService`] talks to `POST /api/generate`.
//!
//! # Wire format
//!
//! Request body:
//!
//! ```json
//! { "input": "hi", "history": [{"role": "user", "content": "..."}], "temperature": 0.6 }
//! ```
//!
//! A `200` response carries `{ "result": "..." }`. Any other status carries
//! `{ "error": ... }` where the error may be any JSON value.

mod error;
mod http;

pub use error::CompletionError;
pub use http::HttpCompletionService;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::conversation::History;

/// Body of a completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// The user's new prompt.
    pub input: String,
    /// Prior turns of the conversation.
    pub history: History,
    /// Sampling temperature.
    pub temperature: f32,
}

/// Successful completion body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub result: String,
}

/// Failure body returned alongside a non-OK status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateFailure {
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

/// Generates assistant replies.
#[async_trait]
pub trait CompletionService: Send + Sync + std::fmt::Debug {
    /// Produce the assistant reply for `request`.
    async fn generate(&self, request: &GenerateRequest) -> Result<String, CompletionError>;
}
