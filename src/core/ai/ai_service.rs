use super::models::{AiConfig, AiMessage, AiProviderResponse};
use async_trait::async_trait;
use thiserror::Error;

/// Everything that can go wrong while asking a language model for slides.
#[derive(Debug, Error)]
pub enum AiError {
    /// The monthly call quota is exhausted. Never retried.
    #[error("LIMIT_REACHED")]
    LimitReached,

    /// Rate limited (429) or overloaded (503). Eligible for backoff.
    #[error("Model temporarily unavailable ({status}): {message}")]
    Transient { status: u16, message: String },

    #[error("AI provider error: {0}")]
    Provider(String),

    #[error("Usage tracking error: {0}")]
    Usage(String),
}

impl AiError {
    pub fn is_limit_reached(&self) -> bool {
        matches!(self, AiError::LimitReached)
    }
}

impl From<reqwest::Error> for AiError {
    fn from(err: reqwest::Error) -> Self {
        AiError::Provider(err.to_string())
    }
}

#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Sends a chat completion request to the AI provider.
    ///
    /// Returns an `AiProviderResponse` containing both the main content
    /// and optional thinking/reasoning from the model.
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, AiError>;
}

// Lets the composition root pick Gemini or OpenRouter at runtime.
#[async_trait]
impl AiProvider for Box<dyn AiProvider> {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, AiError> {
        (**self).chat_complete(messages, config).await
    }
}
