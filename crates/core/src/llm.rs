//! Generation backend access.
//!
//! The synthesizer talks to a [`GenerationBackend`]; [`GroqClient`] is the
//! production implementation against an OpenAI-compatible chat completions
//! endpoint. Failures are classified into [`GenerationErrorKind`] so callers
//! can tell bad credentials from throttling.
//!
//! [`GenerationErrorKind`]: crate::GenerationErrorKind

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{GenerationError, RepriseError, Result};

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// One request to the generation backend.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// A language model that turns a system and user instruction into text.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> std::result::Result<String, GenerationError>;
}

/// Connection settings for the chat completions endpoint.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Base URL; `/chat/completions` is appended.
    pub base_url: String,
    /// Bearer token. Requests fail with an auth error when unset.
    pub api_key: Option<String>,
    /// Request timeout in seconds, longer than page fetches.
    pub timeout: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self { base_url: GROQ_API_URL.to_string(), api_key: None, timeout: 120 }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: u64,
}

/// Client for Groq's OpenAI-compatible chat completions API.
#[derive(Debug, Clone)]
pub struct GroqClient {
    http: Client,
    config: LlmConfig,
}

impl GroqClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(RepriseError::Transport)?;

        Ok(Self { http, config })
    }

    pub fn has_api_key(&self) -> bool {
        self.config.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Sends a tiny prompt to confirm the backend accepts our credentials.
    ///
    /// Returns `false` without a network call when no API key is configured.
    pub async fn health_check(&self, model: &str) -> bool {
        if !self.has_api_key() {
            warn!("generation API key not set");
            return false;
        }

        let request = CompletionRequest {
            model: model.to_string(),
            system: String::new(),
            user: "Hi".to_string(),
            max_tokens: 5,
            temperature: 0.0,
        };

        match self.complete(&request).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "generation health check failed");
                false
            }
        }
    }
}

#[async_trait]
impl GenerationBackend for GroqClient {
    async fn complete(&self, request: &CompletionRequest) -> std::result::Result<String, GenerationError> {
        let api_key = match self.config.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => key,
            _ => return Err(GenerationError::auth("API key is not set")),
        };

        let mut messages = Vec::with_capacity(2);
        if !request.system.is_empty() {
            messages.push(ChatMessage { role: "system", content: &request.system });
        }
        messages.push(ChatMessage { role: "user", content: &request.user });

        let body = ChatRequest {
            model: &request.model,
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        debug!(model = %request.model, url, "chat completion request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::other(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GenerationError::from_status(status.as_u16(), text.trim()));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| GenerationError::other(e.to_string()))?;

        if let Some(usage) = &parsed.usage {
            info!(tokens = usage.total_tokens, "chat completion finished");
        }

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| GenerationError::other("empty reply from generation backend"))
    }
}
