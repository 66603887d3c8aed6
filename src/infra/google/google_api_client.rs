// =============================================================================
// GOOGLE SLIDES + DRIVE REST CLIENT
// =============================================================================
//
// `SlidesBackend` over plain HTTPS. The first call loads the discovery
// documents for Slides v1 and Drive v3 with the API key and takes the service
// base URLs from them; later calls reuse the result.
//
// **Endpoints used:**
// - Drive  `files.list`, `files.create` (folders), `files.copy`
// - Slides `presentations.get`, `presentations.batchUpdate`

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::OnceCell;
use url::Url;

use crate::core::presentation::backend::{folder_query, FOLDER_MIME_TYPE};
use crate::core::presentation::{AccessToken, ApiError, Presentation, Request, SlidesBackend};

const SLIDES_DISCOVERY_URL: &str = "https://slides.googleapis.com/$discovery/rest?version=v1";
const DRIVE_DISCOVERY_URL: &str = "https://www.googleapis.com/discovery/v1/apis/drive/v3/rest";

/// The bits of a discovery document we need to build request URLs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiscoveryDocument {
    root_url: String,
    #[serde(default)]
    service_path: String,
}

impl DiscoveryDocument {
    fn base_url(&self) -> Result<Url, ApiError> {
        let joined = format!("{}{}", self.root_url, self.service_path);
        Url::parse(&joined).map_err(|e| ApiError::Decode(format!("bad base url {joined}: {e}")))
    }
}

#[derive(Debug, Clone)]
struct Endpoints {
    slides: Url,
    drive: Url,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileRef>,
}

#[derive(Debug, Deserialize)]
struct FileRef {
    id: String,
}

pub struct GoogleApiClient {
    client: Client,
    api_key: String,
    endpoints: OnceCell<Endpoints>,
}

impl GoogleApiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            endpoints: OnceCell::new(),
        }
    }

    async fn discover(&self, discovery_url: &str) -> Result<Url, ApiError> {
        let url = Url::parse_with_params(discovery_url, &[("key", self.api_key.as_str())])
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        let response = self.client.get(url).send().await.map_err(transport)?;
        let doc: DiscoveryDocument = read_json(response).await?;
        doc.base_url()
    }

    async fn endpoints(&self) -> Result<&Endpoints, ApiError> {
        self.endpoints
            .get_or_try_init(|| async {
                let slides = self.discover(SLIDES_DISCOVERY_URL).await?;
                let drive = self.discover(DRIVE_DISCOVERY_URL).await?;
                tracing::info!(%slides, %drive, "Google API client initialized");
                Ok(Endpoints { slides, drive })
            })
            .await
    }

    async fn drive_url(&self, path: &str) -> Result<Url, ApiError> {
        join(&self.endpoints().await?.drive, path)
    }

    async fn slides_url(&self, path: &str) -> Result<Url, ApiError> {
        join(&self.endpoints().await?.slides, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        token: &AccessToken,
    ) -> Result<T, ApiError> {
        let response = request
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(transport)?;
        read_json(response).await
    }
}

fn join(base: &Url, path: &str) -> Result<Url, ApiError> {
    base.join(path)
        .map_err(|e| ApiError::Decode(format!("bad request path {path}: {e}")))
}

fn transport(err: reqwest::Error) -> ApiError {
    ApiError::Transport(err.to_string())
}

/// Decodes a success body, or turns Google's error envelope into `ApiError::Http`.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let text = response.text().await.map_err(transport)?;
    if !status.is_success() {
        return Err(http_error(status.as_u16(), &text));
    }
    serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
}

fn http_error(status: u16, body: &str) -> ApiError {
    let message = serde_json::from_str::<GoogleErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.to_string());
    ApiError::Http { status, message }
}

#[async_trait]
impl SlidesBackend for GoogleApiClient {
    async fn initialize(&self) -> Result<(), ApiError> {
        self.endpoints().await.map(|_| ())
    }

    async fn find_folder(
        &self,
        token: &AccessToken,
        name: &str,
        parent_id: &str,
    ) -> Result<Option<String>, ApiError> {
        let mut url = self.drive_url("files").await?;
        url.query_pairs_mut()
            .append_pair("q", &folder_query(name, parent_id))
            .append_pair("fields", "files(id, name)");
        let list: FileList = self.send(self.client.get(url), token).await?;
        Ok(list.files.into_iter().next().map(|f| f.id))
    }

    async fn create_folder(
        &self,
        token: &AccessToken,
        name: &str,
        parent_id: &str,
    ) -> Result<String, ApiError> {
        let mut url = self.drive_url("files").await?;
        url.query_pairs_mut().append_pair("fields", "id");
        let body = json!({
            "name": name,
            "mimeType": FOLDER_MIME_TYPE,
            "parents": [parent_id],
        });
        let folder: FileRef = self.send(self.client.post(url).json(&body), token).await?;
        Ok(folder.id)
    }

    async fn copy_file(
        &self,
        token: &AccessToken,
        file_id: &str,
        name: &str,
        parent_id: &str,
    ) -> Result<String, ApiError> {
        let mut url = self.drive_url(&format!("files/{file_id}/copy")).await?;
        url.query_pairs_mut().append_pair("fields", "id");
        let body = json!({ "name": name, "parents": [parent_id] });
        let copy: FileRef = self.send(self.client.post(url).json(&body), token).await?;
        Ok(copy.id)
    }

    async fn get_presentation(
        &self,
        token: &AccessToken,
        presentation_id: &str,
    ) -> Result<Presentation, ApiError> {
        let url = self
            .slides_url(&format!("v1/presentations/{presentation_id}"))
            .await?;
        self.send(self.client.get(url), token).await
    }

    async fn batch_update(
        &self,
        token: &AccessToken,
        presentation_id: &str,
        requests: &[Request],
    ) -> Result<(), ApiError> {
        let url = self
            .slides_url(&format!("v1/presentations/{presentation_id}:batchUpdate"))
            .await?;
        tracing::debug!(presentation_id, requests = requests.len(), "Slides batchUpdate");
        let _: serde_json::Value = self
            .send(
                self.client.post(url).json(&json!({ "requests": requests })),
                token,
            )
            .await?;
        Ok(())
    }
}
