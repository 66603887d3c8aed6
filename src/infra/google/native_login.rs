// =============================================================================
// NATIVE SIGN-IN
// =============================================================================
//
// Native sign-in goes through a platform login plugin. The plugin is
// initialized once with every scope the app will ever need; scopes cannot be
// added at login time. Each login hands back an access token that the session
// installs as the shared token.
//
// `RefreshTokenLogin` is the plugin used on desktop: it redeems a stored
// OAuth refresh token at Google's token endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::OnceCell;

use super::DRIVE_FILE_SCOPE;
use crate::core::presentation::{AccessToken, AuthError, Platform, TokenProvider};

pub const LOGIN_FAILED: &str = "User cancelled sign-in or native auth failed.";
pub const LOGIN_WITHOUT_TOKEN: &str = "Native login succeeded but returned no token.";

const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Options fixed when the plugin is initialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeLoginOptions {
    pub web_client_id: String,
    /// `online` asks for an access token only, no server auth code.
    pub mode: String,
    pub scopes: Vec<String>,
}

impl NativeLoginOptions {
    pub fn google(web_client_id: impl Into<String>) -> Self {
        Self {
            web_client_id: web_client_id.into(),
            mode: "online".to_string(),
            scopes: vec![
                "email".to_string(),
                "profile".to_string(),
                DRIVE_FILE_SCOPE.to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NativeLoginResult {
    pub access_token: Option<String>,
    pub expires_in: Option<u64>,
}

/// A platform social-login plugin.
#[async_trait]
pub trait NativeLoginPlugin: Send + Sync {
    async fn initialize(&self, options: &NativeLoginOptions) -> Result<(), AuthError>;
    async fn login(&self) -> Result<NativeLoginResult, AuthError>;
}

pub struct NativeTokenProvider<P: NativeLoginPlugin> {
    plugin: P,
    options: NativeLoginOptions,
    initialized: OnceCell<()>,
}

impl<P: NativeLoginPlugin> NativeTokenProvider<P> {
    pub fn new(plugin: P, options: NativeLoginOptions) -> Self {
        Self {
            plugin,
            options,
            initialized: OnceCell::new(),
        }
    }
}

#[async_trait]
impl<P: NativeLoginPlugin> TokenProvider for NativeTokenProvider<P> {
    fn platform(&self) -> Platform {
        Platform::Native
    }

    async fn initialize(&self) -> Result<(), AuthError> {
        self.initialized
            .get_or_try_init(|| async {
                self.plugin.initialize(&self.options).await?;
                tracing::info!(scopes = ?self.options.scopes, "Native sign-in initialized");
                Ok::<(), AuthError>(())
            })
            .await
            .map(|_| ())
    }

    async fn acquire(&self) -> Result<AccessToken, AuthError> {
        let result = self.plugin.login().await.map_err(|e| {
            tracing::warn!("Native login failed: {}", e);
            AuthError::Denied(LOGIN_FAILED.to_string())
        })?;

        let secret = result
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::Denied(LOGIN_WITHOUT_TOKEN.to_string()))?;
        let lifetime = result
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME);

        Ok(AccessToken::expiring_in(secret, lifetime))
    }
}

// =============================================================================
// REFRESH TOKEN PLUGIN
// =============================================================================

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
}

pub struct RefreshTokenLogin {
    client: Client,
    refresh_token: String,
    client_secret: Option<String>,
    token_url: String,
    options: OnceCell<NativeLoginOptions>,
}

impl RefreshTokenLogin {
    pub fn new(refresh_token: String, client_secret: Option<String>) -> Self {
        Self {
            client: Client::new(),
            refresh_token,
            client_secret,
            token_url: GOOGLE_TOKEN_URL.to_string(),
            options: OnceCell::new(),
        }
    }

    fn form(&self, options: &NativeLoginOptions) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("grant_type", "refresh_token".to_string()),
            ("client_id", options.web_client_id.clone()),
            ("refresh_token", self.refresh_token.clone()),
        ];
        if let Some(secret) = &self.client_secret {
            form.push(("client_secret", secret.clone()));
        }
        form
    }
}

#[async_trait]
impl NativeLoginPlugin for RefreshTokenLogin {
    async fn initialize(&self, options: &NativeLoginOptions) -> Result<(), AuthError> {
        if options.web_client_id.trim().is_empty() {
            return Err(AuthError::Setup("GOOGLE_CLIENT_ID is empty".to_string()));
        }
        if self.refresh_token.trim().is_empty() {
            return Err(AuthError::Setup("GOOGLE_REFRESH_TOKEN is empty".to_string()));
        }
        self.options
            .set(options.clone())
            .map_err(|_| AuthError::Setup("native sign-in initialized twice".to_string()))
    }

    async fn login(&self) -> Result<NativeLoginResult, AuthError> {
        let options = self
            .options
            .get()
            .ok_or_else(|| AuthError::Setup("native sign-in used before initialize".to_string()))?;

        let response = self
            .client
            .post(&self.token_url)
            .form(&self.form(options))
            .send()
            .await
            .map_err(|e| AuthError::Denied(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AuthError::Denied(format!(
                "Refresh token rejected ({}): {}",
                status, text
            )));
        }

        let body: RefreshResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Denied(e.to_string()))?;
        Ok(NativeLoginResult {
            access_token: body.access_token,
            expires_in: body.expires_in,
        })
    }
}
