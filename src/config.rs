// Runtime configuration, read from the environment (and `.env` via dotenv).
//
// **Required:**
// - `GOOGLE_CLIENT_ID` - OAuth client id used by every sign-in flow
// - `GOOGLE_API_KEY` - API key for loading the Slides/Drive discovery documents
//
// **Optional:**
// - `GOOGLE_SLIDES_TEMPLATE_ID` - Deck cloned for every presentation
// - `GOOGLE_AUTH_MODE` - `web` (default), `native`, or `service_account`
// - `GOOGLE_CLIENT_SECRET`, `GOOGLE_REFRESH_TOKEN` - native mode
// - `GOOGLE_REDIRECT_URI` - web mode callback
// - `GOOGLE_SERVICE_ACCOUNT_KEY` / `GOOGLE_SERVICE_ACCOUNT_JSON` - service account mode
// - `AI_PROVIDER` - `gemini` (default) or `openrouter`
// - `GEMINI_API_KEY`, `GEMINI_MODEL`, `OPENROUTER_API_KEY`, `OPENROUTER_MODEL`
// - `AI_MONTHLY_CALL_LIMIT` - model calls allowed per calendar month
// - `DATA_DIR` - where the usage ledger and parked requests live

use std::path::PathBuf;
use thiserror::Error;

use crate::core::ai::model_gateway::DEFAULT_MONTHLY_CALL_LIMIT;

pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080/oauth/callback";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_OPENROUTER_MODEL: &str = "deepseek/deepseek-chat-v3.1:free";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing {0} environment variable!")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Web,
    Native,
    ServiceAccount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProviderKind {
    Gemini,
    OpenRouter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceAccountKey {
    Path(String),
    Json(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub google_client_id: String,
    pub google_api_key: String,
    pub template_id: Option<String>,
    pub auth_mode: AuthMode,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub redirect_uri: String,
    pub service_account_key: Option<ServiceAccountKey>,
    pub ai_provider: AiProviderKind,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub openrouter_api_key: Option<String>,
    pub openrouter_model: String,
    pub monthly_call_limit: u64,
    pub data_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let auth_mode = match get("GOOGLE_AUTH_MODE").as_deref().map(str::to_lowercase) {
            None => AuthMode::Web,
            Some(mode) => match mode.as_str() {
                "web" => AuthMode::Web,
                "native" => AuthMode::Native,
                "service_account" => AuthMode::ServiceAccount,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "GOOGLE_AUTH_MODE",
                        value: mode,
                    })
                }
            },
        };

        let ai_provider = match get("AI_PROVIDER").as_deref().map(str::to_lowercase) {
            None => AiProviderKind::Gemini,
            Some(provider) => match provider.as_str() {
                "gemini" => AiProviderKind::Gemini,
                "openrouter" => AiProviderKind::OpenRouter,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "AI_PROVIDER",
                        value: provider,
                    })
                }
            },
        };

        let service_account_key = get("GOOGLE_SERVICE_ACCOUNT_KEY")
            .map(ServiceAccountKey::Path)
            .or_else(|| get("GOOGLE_SERVICE_ACCOUNT_JSON").map(ServiceAccountKey::Json));

        let refresh_token = get("GOOGLE_REFRESH_TOKEN");
        match auth_mode {
            AuthMode::Native if refresh_token.is_none() => {
                return Err(ConfigError::Missing("GOOGLE_REFRESH_TOKEN"))
            }
            AuthMode::ServiceAccount if service_account_key.is_none() => {
                return Err(ConfigError::Missing("GOOGLE_SERVICE_ACCOUNT_KEY"))
            }
            _ => {}
        }

        let monthly_call_limit = match get("AI_MONTHLY_CALL_LIMIT") {
            None => DEFAULT_MONTHLY_CALL_LIMIT,
            Some(v) => v.parse::<u64>().map_err(|_| ConfigError::Invalid {
                key: "AI_MONTHLY_CALL_LIMIT",
                value: v,
            })?,
        };

        Ok(Self {
            google_client_id: require("GOOGLE_CLIENT_ID")?,
            google_api_key: require("GOOGLE_API_KEY")?,
            template_id: get("GOOGLE_SLIDES_TEMPLATE_ID"),
            auth_mode,
            client_secret: get("GOOGLE_CLIENT_SECRET"),
            refresh_token,
            redirect_uri: get("GOOGLE_REDIRECT_URI")
                .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
            service_account_key,
            ai_provider,
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            openrouter_api_key: get("OPENROUTER_API_KEY"),
            openrouter_model: get("OPENROUTER_MODEL")
                .unwrap_or_else(|| DEFAULT_OPENROUTER_MODEL.to_string()),
            monthly_call_limit,
            data_dir: get("DATA_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("data")),
        })
    }

    /// API key and model for the selected provider. Only needed for generation.
    pub fn ai_credentials(&self) -> Result<(&str, &str), ConfigError> {
        match self.ai_provider {
            AiProviderKind::Gemini => self
                .gemini_api_key
                .as_deref()
                .map(|key| (key, self.gemini_model.as_str()))
                .ok_or(ConfigError::Missing("GEMINI_API_KEY")),
            AiProviderKind::OpenRouter => self
                .openrouter_api_key
                .as_deref()
                .map(|key| (key, self.openrouter_model.as_str()))
                .ok_or(ConfigError::Missing("OPENROUTER_API_KEY")),
        }
    }

    pub fn usage_ledger_path(&self) -> PathBuf {
        self.data_dir.join("ai_usage.json")
    }

    pub fn oauth_state_path(&self) -> PathBuf {
        self.data_dir.join("oauth_state")
    }
}
