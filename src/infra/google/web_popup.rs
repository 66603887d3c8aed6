// =============================================================================
// WEB CONSENT REDIRECT
// =============================================================================
//
// Browser flow using the OAuth implicit grant. Without a live token the
// provider builds a consent URL and reports `RedirectInProgress`; the caller
// parks its request and sends the user off. Google then redirects back with
// `#access_token=...&expires_in=...&state=...`, which `complete_redirect`
// checks and installs into the shared session.
//
// The expected `state` is kept in memory and, when a state file is set, on
// disk too, so the callback can be handled by a later process.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use url::Url;

use super::DRIVE_FILE_SCOPE;
use crate::core::presentation::{AccessToken, AuthError, AuthSession, Platform, TokenProvider};

const CONSENT_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

pub struct WebPopupTokenProvider {
    client_id: String,
    redirect_uri: String,
    session: Arc<AuthSession>,
    state_file: Option<PathBuf>,
    expected_state: Mutex<Option<String>>,
}

impl WebPopupTokenProvider {
    pub fn new(client_id: String, redirect_uri: String, session: Arc<AuthSession>) -> Self {
        Self {
            client_id,
            redirect_uri,
            session,
            state_file: None,
            expected_state: Mutex::new(None),
        }
    }

    pub fn with_state_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_file = Some(path.into());
        self
    }

    fn consent_url(&self, state: &str) -> Result<Url, AuthError> {
        Url::parse_with_params(
            CONSENT_ENDPOINT,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "token"),
                ("scope", DRIVE_FILE_SCOPE),
                ("state", state),
                ("prompt", ""),
            ],
        )
        .map_err(|e| AuthError::Setup(format!("cannot build consent URL: {e}")))
    }

    async fn remember_state(&self, state: &str) -> Result<(), AuthError> {
        *self.expected_state.lock().await = Some(state.to_string());
        if let Some(path) = &self.state_file {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| AuthError::Setup(e.to_string()))?;
            }
            tokio::fs::write(path, state)
                .await
                .map_err(|e| AuthError::Setup(format!("cannot store OAuth state: {e}")))?;
        }
        Ok(())
    }

    async fn take_state(&self) -> Option<String> {
        let in_memory = self.expected_state.lock().await.take();
        let on_disk = match &self.state_file {
            Some(path) => {
                let stored = tokio::fs::read_to_string(path).await.ok();
                let _ = tokio::fs::remove_file(path).await;
                stored.map(|s| s.trim().to_string())
            }
            None => None,
        };
        in_memory.or(on_disk)
    }

    /// Handles the URL Google redirected back to and installs its token.
    pub async fn complete_redirect(&self, callback_url: &str) -> Result<AccessToken, AuthError> {
        let url = Url::parse(callback_url)
            .map_err(|e| AuthError::Denied(format!("Invalid callback URL: {e}")))?;
        let params = callback_params(&url);

        if let Some(error) = params.get("error") {
            let _ = self.take_state().await;
            return Err(AuthError::Denied(format!("Google sign-in failed: {error}")));
        }

        let expected = self.take_state().await;
        match (expected.as_deref(), params.get("state").map(String::as_str)) {
            (Some(expected), Some(received)) if expected == received => {}
            _ => {
                return Err(AuthError::Denied(
                    "Sign-in response did not match this request.".to_string(),
                ))
            }
        }

        let secret = params
            .get("access_token")
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::Denied("Sign-in response carried no token.".to_string()))?;
        let lifetime = params
            .get("expires_in")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME);

        let token = AccessToken::expiring_in(secret.clone(), lifetime);
        self.session.begin_flow().await.install(token.clone()).await;
        tracing::info!("Web sign-in completed");
        Ok(token)
    }
}

/// Implicit-grant responses arrive in the fragment; errors may use the query.
fn callback_params(url: &Url) -> HashMap<String, String> {
    let mut params: HashMap<String, String> = url.query_pairs().into_owned().collect();
    if let Some(fragment) = url.fragment() {
        params.extend(url::form_urlencoded::parse(fragment.as_bytes()).into_owned());
    }
    params
}

fn random_state() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[async_trait]
impl TokenProvider for WebPopupTokenProvider {
    fn platform(&self) -> Platform {
        Platform::Web
    }

    async fn initialize(&self) -> Result<(), AuthError> {
        Url::parse(&self.redirect_uri)
            .map(|_| ())
            .map_err(|e| AuthError::Setup(format!("GOOGLE_REDIRECT_URI is not a URL: {e}")))
    }

    async fn acquire(&self) -> Result<AccessToken, AuthError> {
        let state = random_state();
        let consent_url = self.consent_url(&state)?;
        self.remember_state(&state).await?;
        Err(AuthError::RedirectInProgress {
            consent_url: consent_url.into(),
        })
    }
}
