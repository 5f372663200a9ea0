//! OpenAI-compatible chat-completions client

use crate::collaborator::{CollaboratorError, TextGenerator};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const BODY_SNIPPET: usize = 200;

/// Connection settings for the completion endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL; `/chat/completions` is appended
    pub base_url: String,
    /// Bearer token, if the endpoint wants one
    pub api_key: Option<String>,
    /// Completion length cap
    pub max_tokens: u32,
    /// Whole-request timeout
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            api_key: None,
            max_tokens: 8192,
            timeout_secs: 120,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// [`TextGenerator`] backed by an HTTP chat-completions endpoint
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    max_tokens: u32,
}

impl ChatCompletionsClient {
    /// Build a client from provider settings
    ///
    /// # Errors
    /// Returns the reqwest builder error if the TLS backend cannot start
    pub fn new(config: &ProviderConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            max_tokens: config.max_tokens,
        })
    }

    /// Full completion URL
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionsClient {
    async fn complete(&self, prompt: &str, model_id: &str) -> Result<String, CollaboratorError> {
        let body = ChatRequest {
            model: model_id,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
        };

        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|error| {
            if error.is_connect() {
                CollaboratorError::Unavailable(error.to_string())
            } else {
                CollaboratorError::Transient(error.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), retry_after, &body));
        }

        let payload: ChatResponse = response.json().await.map_err(|error| {
            CollaboratorError::Transient(format!("malformed completion payload: {error}"))
        })?;
        Ok(payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

/// Map a non-success status to a failure category
pub(crate) fn classify_status(
    status: u16,
    retry_after: Option<Duration>,
    body: &str,
) -> CollaboratorError {
    match status {
        401 | 403 => CollaboratorError::Unauthenticated,
        404 | 503 => CollaboratorError::Unavailable(format!("HTTP {status}")),
        429 => CollaboratorError::RateLimited { retry_after },
        _ => {
            let snippet: String = body.chars().take(BODY_SNIPPET).collect();
            CollaboratorError::Transient(format!("HTTP {status}: {}", snippet.trim()))
        }
    }
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
