//! HTTP client for the `/api/generate` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;
use url::Url;

use super::{CompletionError, CompletionService, GenerateFailure, GenerateRequest, GenerateResponse};

const GENERATE_PATH: &str = "/api/generate";

/// Completion service backed by a remote HTTP endpoint.
///
/// # Example
///
/// ```rust,no_run
/// use mychatgpt::completion::{CompletionService, GenerateRequest, HttpCompletionService};
/// use mychatgpt::conversation::History;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = HttpCompletionService::new("http://localhost:3000")?;
/// let reply = service
///     .generate(&GenerateRequest {
///         input: "Hello!".into(),
///         history: History::new(),
///         temperature: 0.6,
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpCompletionService {
    endpoint: Url,
    http: reqwest::Client,
}

impl HttpCompletionService {
    /// Create a client for the server at `base_url`.
    ///
    /// No request timeout is applied.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, CompletionError> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a client whose requests give up after `timeout`.
    pub fn with_timeout(
        base_url: impl AsRef<str>,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Self::with_client(base_url, http)
    }

    /// Create a client with a custom reqwest client.
    pub fn with_client(
        base_url: impl AsRef<str>,
        http: reqwest::Client,
    ) -> Result<Self, CompletionError> {
        let endpoint = Url::parse(base_url.as_ref())?.join(GENERATE_PATH)?;
        Ok(Self { endpoint, http })
    }

    /// Full URL requests are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn handle_response(response: reqwest::Response) -> Result<String, CompletionError> {
        let status = response.status();
        let body = response.bytes().await?;

        if status == StatusCode::OK {
            let parsed: GenerateResponse = serde_json::from_slice(&body)
                .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;
            Ok(parsed.result)
        } else {
            // A failure body that is not JSON carries no payload.
            let failure: GenerateFailure = serde_json::from_slice(&body).unwrap_or_default();
            Err(CompletionError::Request {
                status: status.as_u16(),
                error: failure.error,
            })
        }
    }
}

#[async_trait]
impl CompletionService for HttpCompletionService {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, CompletionError> {
        debug!(
            name: "completion.request.sent",
            endpoint = %self.endpoint,
            history_len = request.history.len(),
            temperature = request.temperature,
            "Posting completion request"
        );

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;
        Self::handle_response(response).await
    }
}
