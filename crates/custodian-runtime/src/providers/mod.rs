//! LLM Provider abstractions for custodian-runtime.
//!
//! This module defines the trait for LLM providers and the Gemini
//! implementation used by the verdict pipeline.
//!
//! ## Security
//!
//! All providers use the [`secrets`] module for secure credential handling.
//! See [`ApiCredential`] for the recommended patterns.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

mod factory;
pub mod secrets;

#[cfg(feature = "gemini")]
mod gemini;

pub use factory::{ProviderFactory, ProviderRegistry};
pub use secrets::{ApiCredential, CredentialSource};

#[cfg(feature = "gemini")]
pub use gemini::{GeminiProvider, GeminiProviderFactory};

/// Environment variables checked, in order, for the Gemini API key.
pub const GEMINI_KEY_ENV_VARS: &[&str] = &["GOOGLE_API_KEY", "GEMINI_API_KEY"];

/// Errors from LLM providers.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    ParseError(String),

    #[error("Empty response: {0}")]
    EmptyResponse(String),

    #[error("Authentication failed")]
    AuthError,

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// No credential is available
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// Unknown provider type or malformed provider settings
    #[error("Invalid provider configuration: {0}")]
    InvalidConfig(String),
}

/// Configuration for a completion request.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Model to use
    pub model: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Temperature (0.0 for deterministic)
    pub temperature: f32,

    /// Request timeout
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            max_tokens: 2048,
            temperature: 0.0,
            timeout: Duration::from_secs(30),
        }
    }
}

/// A chat message for LLM completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
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
    /// Generated content
    pub content: String,

    /// Token usage
    pub usage: TokenUsage,

    /// Model used
    pub model: String,

    /// Stop reason
    pub stop_reason: Option<String>,
}

/// Token usage from a completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,

    /// Tokens in the completion
    pub completion_tokens: u32,

    /// Prompt tokens served from the provider's context cache
    pub cache_read_tokens: u32,
}

impl TokenUsage {
    /// Total tokens used.
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Provider abstraction allows swapping LLM backends.
///
/// Implementations are shared read-only across concurrent requests and
/// must be safe for concurrent use.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Execute a chat completion.
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Generate content from a single text prompt.
    async fn generate(
        &self,
        prompt: &str,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        self.complete(vec![ChatMessage::user(prompt)], config).await
    }

    /// Check if provider is healthy.
    async fn health_check(&self) -> bool;

    /// Get provider name for metrics.
    fn name(&self) -> &str;
}

/// Generate from a prompt, bounded by `config.timeout`.
///
/// An elapsed timeout is reported as [`ProviderError::Timeout`], the same
/// way a transport-level timeout would be.
pub async fn generate_with_timeout(
    provider: &dyn LlmProvider,
    prompt: &str,
    config: &CompletionConfig,
) -> Result<CompletionResponse, ProviderError> {
    match tokio::time::timeout(config.timeout, provider.generate(prompt, config)).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(config.timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedLlm;

    #[test]
    fn test_chat_message_creation() {
        let system = ChatMessage::system("You are a fact-checking AI.");
        assert_eq!(system.role, "system");

        let user = ChatMessage::user("Hello!");
        assert_eq!(user.role, "user");

        let assistant = ChatMessage::assistant("Hi there!");
        assert_eq!(assistant.role, "assistant");
    }

    #[test]
    fn test_token_usage_total() {
        let usage = TokenUsage {
            prompt_tokens: 100,
            completion_tokens: 50,
            cache_read_tokens: 0,
        };
        assert_eq!(usage.total(), 150);
    }

    #[tokio::test]
    async fn test_generate_sends_single_user_message() {
        let llm = ScriptedLlm::sequence(vec![Ok("ok".to_string())]);
        let response = llm
            .generate("the prompt", &CompletionConfig::default())
            .await
            .unwrap();

        assert_eq!(response.content, "ok");
        assert_eq!(llm.prompts(), vec!["the prompt".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_with_timeout_maps_elapsed() {
        let llm = ScriptedLlm::sequence(vec![Ok("late".to_string())])
            .with_delay(Duration::from_secs(60));
        let config = CompletionConfig {
            timeout: Duration::from_secs(5),
            ..Default::default()
        };

        let result = generate_with_timeout(&llm, "prompt", &config).await;
        assert!(matches!(result, Err(ProviderError::Timeout(d)) if d == Duration::from_secs(5)));
    }
}
