//! Inference provider abstractions for mentor-runtime.
//!
//! This module defines the error type shared by every external tier and the
//! trait for hosted LLM backends, with one implementation speaking the
//! OpenAI-compatible chat-completions protocol.
//!
//! ## Security
//!
//! Providers hold their API key in an [`ApiCredential`], which never shows up
//! in `Debug` or `Display` output.

use async_trait::async_trait;
use mentor_core::ErrorKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub mod secrets;

#[cfg(feature = "remote")]
mod chat_completions;

pub use secrets::{ApiCredential, CredentialSource};

#[cfg(feature = "remote")]
pub use chat_completions::{ChatCompletionsProvider, ChatCompletionsProviderBuilder};

/// Errors from an external tier (worker process or hosted API).
///
/// Every variant maps onto one [`ErrorKind`]; the orchestrator recovers from
/// all of them.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Failed to spawn worker: {0}")]
    SpawnFailed(String),

    #[error("Worker exited with {}: {stderr}", exit_label(.code))]
    WorkerExit { code: Option<i32>, stderr: String },

    #[error("Worker output is not usable: {0}")]
    MalformedWorkerOutput(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Authentication failed with status {status}")]
    AuthError { status: u16 },

    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Malformed upstream response: {0}")]
    ParseError(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

impl ProviderError {
    /// Classification recorded on fallback results.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::NotConfigured(_) => ErrorKind::Unconfigured,
            ProviderError::SpawnFailed(_) => ErrorKind::ProcessSpawnError,
            ProviderError::WorkerExit { .. } => ErrorKind::ProcessExitError,
            ProviderError::MalformedWorkerOutput(_) => ErrorKind::MalformedWorkerOutput,
            ProviderError::Timeout(_) => ErrorKind::Timeout,
            ProviderError::RateLimited { .. } => ErrorKind::RateLimited,
            ProviderError::AuthError { .. } => ErrorKind::Unauthorized,
            ProviderError::HttpError(_) | ProviderError::ApiError { .. } => {
                ErrorKind::NetworkError
            }
            ProviderError::ParseError(_) => ErrorKind::MalformedUpstream,
        }
    }
}

/// Configuration for a completion request.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Model to use
    pub model: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Request timeout
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: "meta-llama/llama-3.1-8b-instruct:free".to_string(),
            max_tokens: 600,
            temperature: 0.3,
            timeout: Duration::from_secs(30),
        }
    }
}

/// A chat message for LLM completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user", or "assistant"
    pub role: String,

    /// Message content
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Response from an LLM completion.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated content of the first choice
    pub content: String,

    /// Token usage
    pub usage: TokenUsage,

    /// Model that answered
    pub model: String,

    /// Finish reason reported for the first choice
    pub finish_reason: Option<String>,
}

/// Token usage from a completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,

    /// Tokens in the completion
    pub completion_tokens: u32,
}

impl TokenUsage {
    /// Total tokens used.
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Hosted LLM backend.
///
/// Implementations make exactly one upstream call per `complete` and never
/// retry.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Execute a chat completion.
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Get provider name for logs.
    fn name(&self) -> &str;
}
