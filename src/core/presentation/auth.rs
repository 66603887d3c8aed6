// =============================================================================
// AUTH SESSION + TOKEN PROVIDERS
// =============================================================================
//
// One `AuthSession` owns the access token every Slides/Drive call uses. Token
// providers (native login, web consent redirect, service account) only produce
// tokens; the session installs them, and only while holding its flow guard, so
// at most one sign-in flow is ever in flight.

use async_trait::async_trait;
use std::fmt;
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard, RwLock};

/// Tokens this close to expiry are treated as already expired.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    secret: String,
    expires_at: SystemTime,
}

impl AccessToken {
    pub fn new(secret: impl Into<String>, expires_at: SystemTime) -> Self {
        Self {
            secret: secret.into(),
            expires_at,
        }
    }

    pub fn expiring_in(secret: impl Into<String>, lifetime: Duration) -> Self {
        Self::new(secret, SystemTime::now() + lifetime)
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn expires_at(&self) -> SystemTime {
        self.expires_at
    }

    pub fn is_live(&self) -> bool {
        self.expires_at > SystemTime::now() + EXPIRY_MARGIN
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Not a failure: the caller must send the user to `consent_url` and stop.
    #[error("REDIRECTING_FOR_AUTH")]
    RedirectInProgress { consent_url: String },
    #[error("{0}")]
    Denied(String),
    #[error("Auth setup failed: {0}")]
    Setup(String),
}

impl AuthError {
    pub fn is_redirect(&self) -> bool {
        matches!(self, AuthError::RedirectInProgress { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Platform sign-in plugin, e.g. a stored refresh token on this machine.
    Native,
    /// Browser consent redirect.
    Web,
    /// Headless service account.
    Server,
}

/// Produces access tokens for one platform.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    fn platform(&self) -> Platform;

    /// One-time setup. Must be cheap and idempotent on repeat calls.
    async fn initialize(&self) -> Result<(), AuthError>;

    /// Obtains a fresh token. The web provider answers with
    /// `AuthError::RedirectInProgress` instead.
    async fn acquire(&self) -> Result<AccessToken, AuthError>;

    /// Whether a 401/403 from the API should trigger one silent re-login.
    fn retries_on_auth_failure(&self) -> bool {
        self.platform() != Platform::Web
    }
}

#[async_trait]
impl TokenProvider for Box<dyn TokenProvider> {
    fn platform(&self) -> Platform {
        (**self).platform()
    }

    async fn initialize(&self) -> Result<(), AuthError> {
        (**self).initialize().await
    }

    async fn acquire(&self) -> Result<AccessToken, AuthError> {
        (**self).acquire().await
    }

    fn retries_on_auth_failure(&self) -> bool {
        (**self).retries_on_auth_failure()
    }
}

#[derive(Default)]
pub struct AuthSession {
    token: RwLock<Option<AccessToken>>,
    flow: Mutex<()>,
}

/// Exclusive right to change the session token. Dropping it ends the flow.
pub struct AuthFlow<'a> {
    session: &'a AuthSession,
    _guard: MutexGuard<'a, ()>,
}

impl AuthFlow<'_> {
    pub async fn current(&self) -> Option<AccessToken> {
        self.session.current_token().await
    }

    pub async fn install(&self, token: AccessToken) {
        *self.session.token.write().await = Some(token);
    }

    pub async fn invalidate(&self) {
        *self.session.token.write().await = None;
    }
}

impl AuthSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// The held token, if it is still live.
    pub async fn current_token(&self) -> Option<AccessToken> {
        self.token
            .read()
            .await
            .as_ref()
            .filter(|token| token.is_live())
            .cloned()
    }

    /// Waits for any other sign-in flow to finish, then starts one.
    pub async fn begin_flow(&self) -> AuthFlow<'_> {
        AuthFlow {
            session: self,
            _guard: self.flow.lock().await,
        }
    }

    /// Returns the live token, asking `provider` for one only when needed.
    pub async fn ensure_token<T>(&self, provider: &T) -> Result<AccessToken, AuthError>
    where
        T: TokenProvider + ?Sized,
    {
        if let Some(token) = self.current_token().await {
            return Ok(token);
        }
        let flow = self.begin_flow().await;
        // Another caller may have finished signing in while we waited.
        if let Some(token) = flow.current().await {
            return Ok(token);
        }
        let token = provider.acquire().await?;
        flow.install(token.clone()).await;
        tracing::info!(platform = ?provider.platform(), "Access token acquired");
        Ok(token)
    }

    /// Drops the held token and signs in again.
    pub async fn reacquire<T>(&self, provider: &T) -> Result<AccessToken, AuthError>
    where
        T: TokenProvider + ?Sized,
    {
        let flow = self.begin_flow().await;
        flow.invalidate().await;
        let token = provider.acquire().await?;
        flow.install(token.clone()).await;
        tracing::info!(platform = ?provider.platform(), "Access token re-acquired");
        Ok(token)
    }
}
