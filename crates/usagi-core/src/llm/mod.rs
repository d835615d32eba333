//! Text-generation client.
//!
//! The pipeline talks to the generation backend through the object-safe
//! [`TextGenerator`] trait so orchestration logic is testable without a
//! network. [`OpenAiClient`] is the production implementation, speaking
//! the Responses API over HTTP.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding the API credential.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Errors from the generation client.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{API_KEY_ENV} が未設定です。例: export {API_KEY_ENV}=...")]
    MissingCredential,

    #[error("generation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("generation API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed generation response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Adapter interface for text generation.
///
/// Given a model identifier and a prompt, returns the generated text.
/// Absence of output text is an empty string, not an error.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, LlmError>;
}

// Compile-time assertion: TextGenerator must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn TextGenerator) {}
};

/// HTTP client for the Responses API.
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OpenAiClient {
    /// Default API endpoint.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com";

    /// Create a client with an explicit credential.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("usagi/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Create a client reading the credential from `OPENAI_API_KEY`.
    ///
    /// Returns [`LlmError::MissingCredential`] when the variable is unset;
    /// callers check this before the pipeline starts.
    pub fn from_env(base_url: impl Into<String>) -> Result<Self, LlmError> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| LlmError::MissingCredential)?;
        Self::new(base_url, api_key)
    }
}

#[derive(Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsesReply {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Default, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct ContentBlock {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

/// Extract the concatenated `output_text` blocks from a Responses API
/// body. Missing or empty output yields an empty string.
fn output_text(body: &str) -> Result<String, serde_json::Error> {
    let reply: ResponsesReply = serde_json::from_str(body)?;
    let mut text = String::new();
    for item in reply.output {
        for block in item.content {
            if block.kind == "output_text" {
                text.push_str(&block.text);
            }
        }
    }
    Ok(text)
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/v1/responses", self.base_url);
        tracing::debug!(model, url = %url, "sending generation request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&ResponsesRequest {
                model,
                input: prompt,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(output_text(&body)?)
    }
}
