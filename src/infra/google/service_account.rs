// =============================================================================
// SERVICE ACCOUNT TOKEN PROVIDER
// =============================================================================
//
// Headless sign-in for servers and scheduled jobs: a signed RS256 JWT is
// exchanged for an access token (OAuth2 JWT bearer grant). No user is
// involved, so an expired token is simply fetched again.
//
// The service account must be able to read the template deck (share it with
// the account's email) and the created decks land in the account's own Drive.
//
// **Environment Variables:**
// - `GOOGLE_SERVICE_ACCOUNT_KEY` - Path to the JSON key file
// - `GOOGLE_SERVICE_ACCOUNT_JSON` - The JSON content directly (for deployment)

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::DRIVE_FILE_SCOPE;
use crate::core::presentation::{AccessToken, AuthError, Platform, TokenProvider};

/// Tokens are valid for an hour; refresh a little early.
const TOKEN_LIFETIME: Duration = Duration::from_secs(55 * 60);

/// Service account credentials from the JSON key file.
#[derive(Debug, Clone, Deserialize)]
struct ServiceAccountCredentials {
    /// The service account email (used as issuer in JWT).
    client_email: String,

    /// The private key in PEM format.
    private_key: String,

    /// The token URI (where to exchange JWT for access token).
    token_uri: String,
}

/// JWT claims for Google OAuth2.
#[derive(Debug, Serialize)]
struct JwtClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: u64,
    /// Max 1 hour after `iat`.
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

pub struct ServiceAccountTokenProvider {
    credentials: ServiceAccountCredentials,
    client: Client,
}

impl ServiceAccountTokenProvider {
    /// Creates a provider from a JSON key file path.
    pub async fn from_file(path: &str) -> Result<Self, AuthError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AuthError::Setup(format!("cannot read service account key {path}: {e}")))?;
        Self::from_json(&content)
    }

    /// Creates a provider from JSON key content.
    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        let credentials: ServiceAccountCredentials = serde_json::from_str(json)
            .map_err(|e| AuthError::Setup(format!("invalid service account key: {e}")))?;
        Ok(Self {
            credentials,
            client: Client::new(),
        })
    }

    fn claims(&self, now: u64) -> JwtClaims {
        JwtClaims {
            iss: self.credentials.client_email.clone(),
            scope: DRIVE_FILE_SCOPE.to_string(),
            aud: self.credentials.token_uri.clone(),
            iat: now,
            exp: now + 3600,
        }
    }

    fn signing_key(&self) -> Result<EncodingKey, AuthError> {
        EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| AuthError::Setup(format!("invalid service account private key: {e}")))
    }

    /// Fetches a new access token from Google.
    async fn fetch_new_token(&self) -> Result<AccessToken, AuthError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AuthError::Setup(e.to_string()))?
            .as_secs();

        let header = Header::new(Algorithm::RS256);
        let jwt = encode(&header, &self.claims(now), &self.signing_key()?)
            .map_err(|e| AuthError::Setup(format!("failed to sign JWT: {e}")))?;

        let response = self
            .client
            .post(&self.credentials.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", &jwt),
            ])
            .send()
            .await
            .map_err(|e| AuthError::Denied(format!("Token exchange failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AuthError::Denied(format!(
                "Token exchange failed ({}): {}",
                status, text
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Denied(format!("Token exchange returned bad JSON: {e}")))?;
        let lifetime = token_response
            .expires_in
            .map(Duration::from_secs)
            .map_or(TOKEN_LIFETIME, |d| d.min(TOKEN_LIFETIME));

        Ok(AccessToken::expiring_in(token_response.access_token, lifetime))
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountTokenProvider {
    fn platform(&self) -> Platform {
        Platform::Server
    }

    async fn initialize(&self) -> Result<(), AuthError> {
        // Fail on a broken key before any Drive work starts.
        self.signing_key().map(|_| ())
    }

    async fn acquire(&self) -> Result<AccessToken, AuthError> {
        tracing::debug!(account = %self.credentials.client_email, "Requesting service account token");
        self.fetch_new_token().await
    }
}
