//! OpenAI Responses API client.
//!
//! Implements [`CompletionService`] with a single `POST /v1/responses` call
//! using a `json_schema` text format. Transient failures are retried only
//! when `max_retries` is non-zero.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::{CompletionService, LlmError, StructuredRequest};

/// Backoff before the first retry; doubles on each further attempt.
const INITIAL_BACKOFF_MS: u64 = 500;

/// Connection settings for [`OpenAiClient`].
#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    /// API root without the `/v1` suffix, e.g. `https://api.openai.com`.
    pub base_url: String,
    /// Per-request timeout. `None` keeps the transport default.
    pub timeout: Option<Duration>,
    /// Extra attempts allowed after a transient failure.
    pub max_retries: u32,
}

impl OpenAiConfig {
    pub const DEFAULT_MODEL: &str = "gpt-4o";
    pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

    /// Config with default model and base URL, no timeout, no retries.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: Self::DEFAULT_MODEL.to_owned(),
            base_url: Self::DEFAULT_BASE_URL.to_owned(),
            timeout: None,
            max_retries: 0,
        }
    }
}

// The API key never appears in logs.
impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

/// Long-lived OpenAI client. Build once and share.
#[derive(Debug)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    http: Client,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        debug!(?config, "OpenAiClient::new");
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| LlmError::Build(e.to_string()))?;
        Ok(Self { config, http })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/responses", self.config.base_url.trim_end_matches('/'))
    }

    /// Build the JSON body for `POST /v1/responses`.
    fn build_request_body(&self, request: &StructuredRequest) -> Value {
        json!({
            "model": self.config.model,
            "instructions": request.instructions,
            "input": [
                {
                    "role": "user",
                    "content": request.user_message,
                }
            ],
            "text": {
                "format": {
                    "type": "json_schema",
                    "name": request.schema_name,
                    "schema": request.schema,
                    "strict": request.strict,
                }
            }
        })
    }

    async fn send_once(&self, url: &str, body: &Value) -> Result<String, LlmError> {
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "send_once: API error");
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: api_error_message(&text),
            });
        }

        let envelope: ResponsesEnvelope = serde_json::from_str(&text)?;
        Ok(envelope.output_text())
    }
}

#[async_trait]
impl CompletionService for OpenAiClient {
    async fn complete(&self, request: &StructuredRequest) -> Result<String, LlmError> {
        let url = self.endpoint();
        let body = self.build_request_body(request);
        debug!(model = %self.config.model, %url, "complete: sending request");

        let mut attempt = 0;
        loop {
            match self.send_once(&url, &body).await {
                Ok(text) => {
                    debug!(attempt, text_len = text.len(), "complete: success");
                    return Ok(text);
                }
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let backoff = backoff_ms(attempt);
                    warn!(attempt, backoff_ms = backoff, error = %e, "complete: retrying after transient error");
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Delay before retry number `attempt` (1-based), doubling from
/// [`INITIAL_BACKOFF_MS`] and saturating at `u64::MAX`.
fn backoff_ms(attempt: u32) -> u64 {
    INITIAL_BACKOFF_MS.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
}

/// Pull a human-readable message out of an error response body.
///
/// OpenAI error bodies look like `{"error": {"message": "..."}}`; anything
/// else is returned as-is.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_owned))
        .unwrap_or_else(|| body.to_owned())
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ResponsesEnvelope {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ResponsesEnvelope {
    /// All `output_text` parts of all `message` items, concatenated in order.
    ///
    /// A top-level `output_text` field wins when present. Refusals and
    /// non-message items contribute nothing, so a response without text
    /// yields an empty string.
    fn output_text(self) -> String {
        if let Some(text) = self.output_text {
            return text;
        }
        self.output
            .into_iter()
            .filter(|item| item.kind == "message")
            .flat_map(|item| item.content)
            .filter(|part| part.kind == "output_text")
            .filter_map(|part| part.text)
            .collect()
    }
}
