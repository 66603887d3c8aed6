use async_trait::async_trait;
use thiserror::Error;

use super::auth::AccessToken;
use super::presentation_models::Presentation;
use super::requests::Request;

pub const DRIVE_ROOT: &str = "root";
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

#[derive(Debug, Error)]
pub enum ApiError {
    /// The API answered with an error; `message` is Google's own text.
    #[error("Google API error ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("Google API request failed: {0}")]
    Transport(String),
    #[error("Unexpected Google API response: {0}")]
    Decode(String),
}

impl ApiError {
    /// 401/403: the token was rejected or lacks access.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Http { status: 401 | 403, .. })
    }
}

/// The Drive and Slides calls the materializer makes.
#[async_trait]
pub trait SlidesBackend: Send + Sync {
    /// Loads API discovery once per process. Later calls are no-ops.
    async fn initialize(&self) -> Result<(), ApiError>;

    /// Exact-name folder lookup directly under `parent_id`.
    async fn find_folder(
        &self,
        token: &AccessToken,
        name: &str,
        parent_id: &str,
    ) -> Result<Option<String>, ApiError>;

    async fn create_folder(
        &self,
        token: &AccessToken,
        name: &str,
        parent_id: &str,
    ) -> Result<String, ApiError>;

    /// Copies `file_id` into `parent_id` as `name`; returns the new file id.
    async fn copy_file(
        &self,
        token: &AccessToken,
        file_id: &str,
        name: &str,
        parent_id: &str,
    ) -> Result<String, ApiError>;

    async fn get_presentation(
        &self,
        token: &AccessToken,
        presentation_id: &str,
    ) -> Result<Presentation, ApiError>;

    async fn batch_update(
        &self,
        token: &AccessToken,
        presentation_id: &str,
        requests: &[Request],
    ) -> Result<(), ApiError>;
}

/// Escapes a value for a single-quoted Drive query literal.
pub fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Drive `files.list` query for a non-trashed folder named `name` in `parent_id`.
pub fn folder_query(name: &str, parent_id: &str) -> String {
    format!(
        "mimeType='{FOLDER_MIME_TYPE}' and name='{}' and '{}' in parents and trashed=false",
        escape_query_value(name),
        escape_query_value(parent_id)
    )
}

pub fn edit_url(presentation_id: &str) -> String {
    format!("https://docs.google.com/presentation/d/{presentation_id}/edit")
}
