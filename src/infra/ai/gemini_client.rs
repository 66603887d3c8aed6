// =============================================================================
// GEMINI CLIENT - Google AI Studio API Integration
// =============================================================================
//
// Implementation of the `AiProvider` trait against Google's Gemini API
// (https://ai.google.dev/gemini-api/docs). Slide generation sends one user
// prompt per lesson page and expects JSON text back.
//
// **Differences from OpenRouter:**
// - Authentication: API key is passed as a query parameter (`?key=API_KEY`)
//   rather than a Bearer token in the Authorization header.
// - Request format: Uses `contents[]` with nested `parts`, and `systemInstruction`
//   is a separate top-level field (not a message with role "system").
// - Response format: Content is at `candidates[0].content.parts[-1].text`;
//   earlier text parts are thought summaries on 2.5+ models.
//
// **Environment Variables:**
// - `GEMINI_API_KEY` - Your API key from https://aistudio.google.com/apikey
// - `GEMINI_MODEL` - Model name, defaults to `gemini-2.5-flash`

use crate::core::ai::{AiConfig, AiError, AiMessage, AiProvider, AiProviderResponse};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

// =============================================================================
// GEMINI API DATA STRUCTURES
// =============================================================================
//
// See: https://ai.google.dev/api/generate-content

/// A single part of a content message.
#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,

    /// Set on thought-summary parts when thoughts are requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
}

/// A content message with role and parts.
#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(default)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,

    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,

    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Content,

    #[allow(dead_code)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorDetail,
}

// =============================================================================
// GEMINI CLIENT IMPLEMENTATION
// =============================================================================

pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }

    fn text_part(text: String) -> Part {
        Part {
            text: Some(text),
            thought: None,
        }
    }

    fn convert_message(msg: &AiMessage) -> Content {
        let role = match msg.role.as_str() {
            "assistant" => "model".to_string(),
            other => other.to_string(),
        };

        Content {
            role,
            parts: vec![Self::text_part(msg.content.clone())],
        }
    }

    fn build_request(messages: &[AiMessage], config: &AiConfig) -> GenerateContentRequest {
        let system_instruction = messages
            .iter()
            .find(|m| m.role == "system")
            .map(|m| Content {
                role: "user".to_string(),
                parts: vec![Self::text_part(m.content.clone())],
            });

        let contents = messages
            .iter()
            .filter(|m| m.role != "system")
            .map(Self::convert_message)
            .collect();

        GenerateContentRequest {
            contents,
            system_instruction,
            generation_config: Some(GenerationConfig {
                temperature: Some(config.temperature),
                max_output_tokens: config.max_tokens,
                top_p: config.top_p,
            }),
        }
    }

    /// Maps a failed HTTP response onto the error taxonomy. 429/503 may be retried.
    fn error_for(status: StatusCode, body: &str) -> AiError {
        let message = serde_json::from_str::<GeminiErrorResponse>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_string());

        match status {
            StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE => AiError::Transient {
                status: status.as_u16(),
                message,
            },
            _ => AiError::Provider(format!("Gemini API error ({}): {}", status, message)),
        }
    }

    /// Last non-thought text part is the answer; anything before it is thinking.
    fn split_answer(parts: &[Part]) -> AiProviderResponse {
        let (thoughts, answers): (Vec<&Part>, Vec<&Part>) = parts
            .iter()
            .filter(|p| p.text.is_some())
            .partition(|p| p.thought.unwrap_or(false));

        let content = answers
            .last()
            .and_then(|p| p.text.clone())
            .unwrap_or_default();

        let mut thinking: Vec<&str> = thoughts.iter().filter_map(|p| p.text.as_deref()).collect();
        if answers.len() > 1 {
            thinking.extend(
                answers[..answers.len() - 1]
                    .iter()
                    .filter_map(|p| p.text.as_deref()),
            );
        }

        AiProviderResponse {
            content,
            thinking: if thinking.is_empty() {
                None
            } else {
                Some(thinking.join("\n\n"))
            },
        }
    }
}

#[async_trait]
impl AiProvider for GeminiClient {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, AiError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, config.model, self.api_key
        );
        let request = Self::build_request(messages, config);

        tracing::debug!(
            "Gemini request to model {}: {} messages",
            config.model,
            messages.len()
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(Self::error_for(status, &error_text));
        }

        let response_json: GenerateContentResponse = response.json().await?;

        let candidate = response_json
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .ok_or_else(|| {
                AiError::Provider(
                    "No content in Gemini response - the model may have been blocked by safety filters"
                        .to_string(),
                )
            })?;

        let answer = Self::split_answer(&candidate.content.parts);

        tracing::debug!(
            "Gemini response received: {} chars content, {} chars thinking",
            answer.content.len(),
            answer.thinking.as_ref().map(|t| t.len()).unwrap_or(0)
        );

        Ok(answer)
    }
}
