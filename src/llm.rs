//! LLM API interaction over the OpenAI chat-completions protocol.
//!
//! # Architecture
//!
//! - [`AskAsync`]: Core trait defining async LLM interaction
//! - [`ChatCompletionClient`]: Sends one chat-completion request per call
//! - [`ask_for_analysis`]: Entry point used by the pipeline, adds timing logs
//!
//! A request carries a fixed system instruction, the user prompt, a token cap
//! and a sampling temperature. The reply is the trimmed content of the first
//! choice. Failures are returned as [`LlmError`] and are never retried.

use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

/// System message sent ahead of every prompt.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The endpoint answered, but not in the chat-completion shape.
    #[error("unexpected response format: {0}")]
    Interface(String),

    #[error("response contained no choices")]
    NoChoices,
}

/// Trait for async LLM interaction.
///
/// Implementors of this trait can send text to an LLM and receive a response.
pub trait AskAsync {
    /// The type of response returned by the LLM.
    type Response;

    /// Send text to the LLM and receive a response.
    async fn ask(&self, text: &str) -> Result<Self::Response, LlmError>;

    /// Identifier of the model answering, for display.
    fn model(&self) -> &str;
}

/// Sampling settings for a chat-completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatCompletionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    settings: ChatSettings,
}

impl ChatCompletionClient {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        api_key: String,
        settings: ChatSettings,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            settings,
        }
    }
}

impl std::fmt::Debug for ChatCompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionClient")
            .field("base_url", &self.base_url)
            .field("settings", &self.settings)
            .finish()
    }
}

impl AskAsync for ChatCompletionClient {
    type Response = String;

    #[instrument(level = "info", skip_all, fields(model = %self.settings.model))]
    async fn ask(&self, text: &str) -> Result<Self::Response, LlmError> {
        let request = ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        let t0 = Instant::now();
        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        let dt = t0.elapsed();

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            warn!(
                status = status.as_u16(),
                elapsed_ms = dt.as_millis(),
                %message,
                "API call failed"
            );
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::Interface(e.to_string()))?;
        let first = parsed.choices.into_iter().next().ok_or(LlmError::NoChoices)?;
        let content = first
            .message
            .content
            .ok_or_else(|| LlmError::Interface("choice message has no content".to_string()))?;
        let reply = content.trim().to_string();

        info!(elapsed_ms = dt.as_millis(), bytes = reply.len(), "API call succeeded");
        Ok(reply)
    }

    fn model(&self) -> &str {
        &self.settings.model
    }
}

/// Send the assembled prompt to the LLM and return its reply.
#[instrument(level = "info", skip_all)]
pub async fn ask_for_analysis<A>(llm: &A, prompt: &str) -> Result<String, LlmError>
where
    A: AskAsync<Response = String>,
{
    let t0 = Instant::now();
    let res = llm.ask(prompt).await;
    let dt = t0.elapsed();

    match &res {
        Ok(_) => info!(elapsed_ms_total = dt.as_millis(), "ask_for_analysis succeeded"),
        Err(e) => error!(elapsed_ms_total = dt.as_millis(), error = %e, "ask_for_analysis failed"),
    }
    res
}
