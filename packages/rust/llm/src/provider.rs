//! LLM provider client.
//!
//! A single-turn chat-completions client for OpenAI-compatible endpoints
//! (Groq by default). Failures carry an explicit [`ProviderErrorKind`] so
//! callers classify by matching the enumerant, never by sniffing status
//! codes or message substrings out of error text.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use researchbrief_shared::{BriefError, Result};

/// Client-side timeout for one completion request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// What went wrong at the provider boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Credentials rejected (401/403). Not retryable.
    Unauthorized,
    /// Too many requests (429). Retryable after a long backoff.
    RateLimited,
    /// Provider-side 5xx failure. Retryable after a short backoff.
    Server,
    /// Connection problems and unclassified HTTP failures.
    Transport,
    /// The completion envelope did not parse.
    Malformed,
}

/// A typed provider failure.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Chat-completions client with a fixed low sampling temperature.
#[derive(Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl LlmClient {
    /// Create a client for `base_url` (e.g. `https://api.groq.com/openai/v1`).
    ///
    /// The base URL is a constructor input so tests can point it at a mock
    /// server.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BriefError::config(format!("failed to build LLM client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// The configured model id.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run one single-turn completion and return the raw response text.
    pub async fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
    ) -> std::result::Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
            // Low temperature: favor deterministic, schema-following output.
            temperature: 0.3,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                ProviderError::new(ProviderErrorKind::Transport, format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "no response body".into());
            let kind = match status.as_u16() {
                401 | 403 => ProviderErrorKind::Unauthorized,
                429 => ProviderErrorKind::RateLimited,
                s if s >= 500 => ProviderErrorKind::Server,
                _ => ProviderErrorKind::Transport,
            };
            return Err(ProviderError::new(kind, format!("HTTP {status}: {detail}")));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            ProviderError::new(
                ProviderErrorKind::Malformed,
                format!("invalid completion envelope: {e}"),
            )
        })?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default())
    }

    /// Minimal health probe: a tiny completion round-trip.
    pub async fn check(&self) -> std::result::Result<(), ProviderError> {
        self.complete("Reply with: ok", 5).await.map(|_| ())
    }
}
