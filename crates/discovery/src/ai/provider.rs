//! AI provider trait and common request types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AiError;

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A message in a conversation with an AI model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }
}

/// Options for text generation.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Sampling temperature (0.0 to 1.0).
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Ask the provider for a JSON object response where supported.
    pub json_mode: bool,
}

/// Response from an AI model.
#[derive(Debug, Clone)]
pub struct AiResponse {
    /// Generated text content.
    pub text: String,
    /// Model that actually served the request.
    pub model: String,
}

/// Trait for AI text-generation providers.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Provider name for logging (e.g. "openai").
    fn name(&self) -> &'static str;

    /// Generate text from a conversation.
    async fn generate(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &GenerateOptions,
    ) -> Result<AiResponse, AiError>;
}
