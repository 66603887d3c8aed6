pub mod gemini_client;
pub mod openrouter_client;
pub mod usage_store;

pub use gemini_client::GeminiClient;
pub use openrouter_client::OpenRouterClient;
pub use usage_store::{InMemoryUsageStore, JsonUsageStore};
