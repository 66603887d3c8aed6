pub mod ai_service;
pub mod model_gateway;
pub mod models;

pub use ai_service::{AiError, AiProvider};
pub use model_gateway::{LimitedModelCaller, ModelCaller, RetryPolicy, UsageStore};
pub use models::{AiConfig, AiMessage, AiProviderResponse, UsageRecord};
