//! Completion backends.
//!
//! Supports:
//! - **OpenAI-compatible** chat completions (Groq, OpenAI, vLLM, LM Studio)
//! - **Ollama** `/api/chat`
//!
//! Backends implement [`CompletionBackend`]; [`CompletionClient`] adds the
//! model, temperature, and the timeout that bounds every call.

pub mod ollama;
pub mod openai;

#[cfg(test)]
pub(crate) mod testing;

pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;

use crate::config::{BackendKind, ModelConfig};
use crate::error::CompletionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Prompt sent by the model-probe command.
pub const PROBE_PROMPT: &str = "Hello, just testing!";

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A chat-completion request in backend-neutral form.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

/// A text-completion service.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Backend name for logs and reports.
    fn name(&self) -> &str;

    /// Generate text for the request.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

/// Create the backend selected in the model config.
pub fn create_backend(config: &ModelConfig) -> Result<Arc<dyn CompletionBackend>, CompletionError> {
    let timeout = Duration::from_secs(config.timeout_seconds);
    tracing::info!(
        "Using {} backend at {} (model: {})",
        config.backend.as_str(),
        config.base_url,
        config.name
    );

    match config.backend {
        BackendKind::Openai => {
            let api_key = config.resolve_api_key();
            if api_key.is_none() {
                warn!(
                    "No API key found (set {} or model.api_key); completions will fail",
                    config.api_key_env
                );
            }
            Ok(Arc::new(OpenAiBackend::new(&config.base_url, api_key, timeout)?))
        }
        BackendKind::Ollama => {
            Ok(Arc::new(OllamaBackend::new(&config.base_url, timeout)?))
        }
    }
}

/// Sends prompts to a backend with fixed model settings and a timeout.
#[derive(Clone)]
pub struct CompletionClient {
    backend: Arc<dyn CompletionBackend>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    timeout: Duration,
}

impl CompletionClient {
    pub fn new(backend: Arc<dyn CompletionBackend>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            backend,
            model: model.into(),
            temperature,
            max_tokens: None,
            timeout: Duration::from_secs(120),
        }
    }

    /// Build a client and its backend from the model config.
    pub fn from_config(config: &ModelConfig) -> Result<Self, CompletionError> {
        let backend = create_backend(config)?;
        Ok(Self::new(backend, &config.name, config.temperature)
            .with_timeout(Duration::from_secs(config.timeout_seconds))
            .with_max_tokens(config.max_tokens))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Complete a single user prompt with the configured model.
    pub async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        self.complete_with(prompt, &self.model, self.temperature).await
    }

    /// Complete a single user prompt with an explicit model and temperature.
    pub async fn complete_with(
        &self,
        prompt: &str,
        model: &str,
        temperature: f32,
    ) -> Result<String, CompletionError> {
        let request = CompletionRequest {
            messages: vec![ChatMessage::user(prompt)],
            model: model.to_string(),
            temperature,
            max_tokens: self.max_tokens,
        };
        self.send(&request).await
    }

    /// Send a tiny prompt to `model` to check that it is usable.
    pub async fn probe(&self, model: &str) -> Result<String, CompletionError> {
        let request = CompletionRequest {
            messages: vec![ChatMessage::user(PROBE_PROMPT)],
            model: model.to_string(),
            temperature: self.temperature,
            max_tokens: Some(10),
        };
        self.send(&request).await
    }

    /// Send a request, giving up after the client timeout.
    pub async fn send(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let started = Instant::now();
        debug!(
            "Sending {} message(s) to {} (model {}, {} prompt chars)",
            request.messages.len(),
            self.backend.name(),
            request.model,
            request.messages.iter().map(|m| m.content.len()).sum::<usize>()
        );

        match tokio::time::timeout(self.timeout, self.backend.complete(request)).await {
            Ok(Ok(text)) => {
                debug!(
                    "Completion received in {:.1}s ({} chars)",
                    started.elapsed().as_secs_f64(),
                    text.len()
                );
                Ok(text)
            }
            Ok(Err(e)) => {
                warn!("Completion failed: {}", e);
                Err(e)
            }
            Err(_) => {
                warn!("Completion timed out after {:?}", self.timeout);
                Err(CompletionError::Timeout(self.timeout))
            }
        }
    }
}

/// Translate a transport error the way both HTTP backends report it.
pub(crate) fn map_send_error(e: reqwest::Error, base_url: &str, timeout: Duration) -> CompletionError {
    if e.is_timeout() {
        CompletionError::Timeout(timeout)
    } else if e.is_connect() {
        CompletionError::Connect(base_url.to_string())
    } else {
        CompletionError::Request(e.to_string())
    }
}

/// Build a `reqwest` client with the request timeout applied.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, CompletionError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| CompletionError::Request(format!("Failed to create HTTP client: {}", e)))
}
