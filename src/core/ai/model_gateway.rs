// The single entry point the slide pipeline uses to talk to a language model.
// It wraps any `AiProvider` with a monthly quota and exponential backoff for
// transient provider failures, and hands back plain text.

use super::ai_service::{AiError, AiProvider};
use super::models::{AiConfig, AiMessage, UsageRecord};
use async_trait::async_trait;
use chrono::{Datelike, Utc};
use std::time::Duration;

/// Anything that turns a prompt into raw model text.
///
/// Implementations may fail with `AiError::LimitReached`, which callers must
/// treat as final and user-visible.
#[async_trait]
pub trait ModelCaller: Send + Sync {
    async fn call_model(&self, prompt: &str) -> Result<String, AiError>;
}

/// Persistence for the monthly call counter.
#[async_trait]
pub trait UsageStore: Send + Sync {
    async fn load(&self) -> Result<Option<UsageRecord>, AiError>;
    async fn save(&self, record: UsageRecord) -> Result<(), AiError>;
}

/// How often and how patiently to retry 429/503 responses.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 7,
            initial_backoff: Duration::from_millis(3000),
        }
    }
}

pub const DEFAULT_MONTHLY_CALL_LIMIT: u64 = 500_000;

pub struct LimitedModelCaller<P: AiProvider, U: UsageStore> {
    provider: P,
    usage: U,
    config: AiConfig,
    monthly_limit: u64,
    retry: RetryPolicy,
}

impl<P: AiProvider, U: UsageStore> LimitedModelCaller<P, U> {
    pub fn new(provider: P, usage: U, config: AiConfig, monthly_limit: u64) -> Self {
        Self {
            provider,
            usage,
            config,
            monthly_limit,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Counts one call against the quota for `month`, resetting on a new month.
    async fn reserve_call(&self, month: u32) -> Result<(), AiError> {
        let next = match self.usage.load().await? {
            Some(record) if record.reset_month == month => {
                if record.call_count >= self.monthly_limit {
                    tracing::warn!("AI monthly limit reached.");
                    return Err(AiError::LimitReached);
                }
                UsageRecord {
                    call_count: record.call_count + 1,
                    reset_month: month,
                }
            }
            _ => UsageRecord {
                call_count: 1,
                reset_month: month,
            },
        };
        self.usage.save(next).await
    }

    /// Gives back a reserved call after a transient failure.
    async fn release_call(&self) -> Result<(), AiError> {
        if let Some(record) = self.usage.load().await? {
            self.usage
                .save(UsageRecord {
                    call_count: record.call_count.saturating_sub(1),
                    ..record
                })
                .await?;
        }
        Ok(())
    }

    async fn call_for_month(&self, prompt: &str, month: u32) -> Result<String, AiError> {
        let messages = [AiMessage::user(prompt)];
        let mut retries_left = self.retry.max_retries;
        let mut backoff = self.retry.initial_backoff;

        loop {
            self.reserve_call(month).await?;

            match self.provider.chat_complete(&messages, &self.config).await {
                Ok(response) => return Ok(strip_code_fences(&response.content)),
                Err(AiError::Transient { status, message }) if retries_left > 0 => {
                    tracing::warn!(
                        "API Error ({}): {} Retrying in {:?}... ({} retries left)",
                        status,
                        message,
                        backoff,
                        retries_left
                    );
                    tokio::time::sleep(backoff).await;
                    self.release_call().await?;
                    retries_left -= 1;
                    backoff *= 2;
                }
                Err(e) => {
                    tracing::error!("Error calling AI service: {}", e);
                    return Err(e);
                }
            }
        }
    }
}

#[async_trait]
impl<P: AiProvider, U: UsageStore> ModelCaller for LimitedModelCaller<P, U> {
    async fn call_model(&self, prompt: &str) -> Result<String, AiError> {
        self.call_for_month(prompt, Utc::now().month()).await
    }
}

/// Removes stray markdown code fences some models wrap around JSON.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}
