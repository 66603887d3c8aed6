// OpenRouter speaks the OpenAI chat-completions format and routes to many
// hosted models. Auth is a Bearer token.

use crate::core::ai::{AiConfig, AiError, AiMessage, AiProvider, AiProviderResponse};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

pub struct OpenRouterClient {
    client: Client,
    api_key: String,
}

impl OpenRouterClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }

    fn error_for(status: StatusCode, text: String) -> AiError {
        match status {
            StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE => AiError::Transient {
                status: status.as_u16(),
                message: text,
            },
            _ => AiError::Provider(format!("OpenRouter API error: {} - {}", status, text)),
        }
    }

    fn parse_answer(response_json: &serde_json::Value) -> Result<AiProviderResponse, AiError> {
        let message = &response_json["choices"][0]["message"];
        let content = message["content"]
            .as_str()
            .ok_or_else(|| AiError::Provider("Failed to parse response content".to_string()))?
            .to_string();
        let thinking = message["reasoning"]
            .as_str()
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        Ok(AiProviderResponse { content, thinking })
    }
}

#[async_trait]
impl AiProvider for OpenRouterClient {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, AiError> {
        let payload = json!({
            "model": config.model,
            "messages": messages,
            "temperature": config.temperature,
            "max_tokens": config.max_tokens,
            "top_p": config.top_p,
        });

        tracing::debug!(
            "OpenRouter request to model {}: {} messages",
            config.model,
            messages.len()
        );

        let response = self
            .client
            .post(OPENROUTER_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(Self::error_for(status, text));
        }

        let response_json: serde_json::Value = response.json().await?;
        Self::parse_answer(&response_json)
    }
}
