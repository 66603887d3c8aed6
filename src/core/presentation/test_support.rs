//! In-memory fakes for the presentation ports.

use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::auth::{AccessToken, AuthError, Platform, TokenProvider};
use super::backend::{ApiError, SlidesBackend};
use super::pending::{PendingOperation, PendingOperationStore, PendingStoreError};
use super::presentation_models::{Page, Presentation};
use super::requests::Request;

struct FolderRecord {
    id: String,
    name: String,
    parent: String,
}

struct FileRecord {
    id: String,
    name: String,
    parent: String,
    slides: Vec<String>,
}

#[derive(Default)]
struct DriveState {
    folders: Vec<FolderRecord>,
    files: Vec<FileRecord>,
    next_id: u32,
    batches: Vec<Vec<Request>>,
    failures: VecDeque<ApiError>,
    batch_failures: VecDeque<ApiError>,
    tokens_seen: Vec<String>,
    discovery_loaded: bool,
    discovery_loads: u32,
    init_calls: u32,
}

impl DriveState {
    fn fresh_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}_{}", self.next_id)
    }

    fn file_mut(&mut self, id: &str) -> Result<&mut FileRecord, ApiError> {
        self.files
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| ApiError::Http {
                status: 404,
                message: format!("File not found: {id}."),
            })
    }
}

/// Simulates Drive folders and files plus slide duplication/deletion.
pub struct FakeSlidesBackend {
    state: Mutex<DriveState>,
}

impl FakeSlidesBackend {
    pub fn with_template(template_id: &str, slide_count: usize) -> Self {
        let mut state = DriveState::default();
        let slides = (0..slide_count)
            .map(|_| state.fresh_id("template_slide"))
            .collect();
        state.files.push(FileRecord {
            id: template_id.to_string(),
            name: "Template".to_string(),
            parent: "root".to_string(),
            slides,
        });
        Self {
            state: Mutex::new(state),
        }
    }

    /// Queues an HTTP failure for the next non-init call.
    pub fn fail_next(&self, status: u16, message: &str) {
        self.state.lock().unwrap().failures.push_back(ApiError::Http {
            status,
            message: message.to_string(),
        });
    }

    /// Queues an HTTP failure for the next `batchUpdate` call only.
    pub fn fail_next_batch(&self, status: u16, message: &str) {
        self.state.lock().unwrap().batch_failures.push_back(ApiError::Http {
            status,
            message: message.to_string(),
        });
    }

    pub fn init_calls(&self) -> u32 {
        self.state.lock().unwrap().init_calls
    }

    pub fn discovery_loads(&self) -> u32 {
        self.state.lock().unwrap().discovery_loads
    }

    pub fn files_named(&self, name: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .files
            .iter()
            .filter(|f| f.name == name)
            .map(|f| f.id.clone())
            .collect()
    }

    pub fn parent_of(&self, file_id: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .files
            .iter()
            .find(|f| f.id == file_id)
            .map(|f| f.parent.clone())
    }

    pub fn slide_count(&self, file_id: &str) -> usize {
        let state = self.state.lock().unwrap();
        state
            .files
            .iter()
            .find(|f| f.id == file_id)
            .map(|f| f.slides.len())
            .unwrap_or(0)
    }

    pub fn folder_id(&self, name: &str, parent: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .folders
            .iter()
            .find(|f| f.name == name && f.parent == parent)
            .map(|f| f.id.clone())
    }

    pub fn folder_count(&self) -> usize {
        self.state.lock().unwrap().folders.len()
    }

    pub fn batches(&self) -> Vec<Vec<Request>> {
        self.state.lock().unwrap().batches.clone()
    }

    pub fn sent_requests(&self) -> Vec<Request> {
        self.batches().into_iter().flatten().collect()
    }

    pub fn tokens_seen(&self) -> Vec<String> {
        self.state.lock().unwrap().tokens_seen.clone()
    }

    fn enter(&self, token: &AccessToken) -> Result<std::sync::MutexGuard<'_, DriveState>, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.tokens_seen.push(token.secret().to_string());
        match state.failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(state),
        }
    }
}

fn fake_page(slide_id: &str) -> Page {
    serde_json::from_value(json!({
        "objectId": slide_id,
        "pageElements": [
            { "objectId": format!("{slide_id}_title"), "shape": { "text": { "textElements": [
                { "textRun": { "content": "{{title}}\n" } }
            ] } } },
            { "objectId": format!("{slide_id}_body"), "shape": { "text": { "textElements": [
                { "textRun": { "content": "{{body}}\n" } }
            ] } } }
        ],
        "slideProperties": { "notesPage": {
            "objectId": format!("{slide_id}_notes"),
            "notesProperties": { "speakerNotesObjectId": format!("{slide_id}_speaker") },
            "pageElements": [ { "objectId": format!("{slide_id}_speaker"), "shape": {} } ]
        } }
    }))
    .unwrap()
}

#[async_trait]
impl SlidesBackend for FakeSlidesBackend {
    async fn initialize(&self) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.init_calls += 1;
        if !state.discovery_loaded {
            state.discovery_loaded = true;
            state.discovery_loads += 1;
        }
        Ok(())
    }

    async fn find_folder(
        &self,
        token: &AccessToken,
        name: &str,
        parent_id: &str,
    ) -> Result<Option<String>, ApiError> {
        let state = self.enter(token)?;
        Ok(state
            .folders
            .iter()
            .find(|f| f.name == name && f.parent == parent_id)
            .map(|f| f.id.clone()))
    }

    async fn create_folder(
        &self,
        token: &AccessToken,
        name: &str,
        parent_id: &str,
    ) -> Result<String, ApiError> {
        let mut state = self.enter(token)?;
        let id = state.fresh_id("folder");
        state.folders.push(FolderRecord {
            id: id.clone(),
            name: name.to_string(),
            parent: parent_id.to_string(),
        });
        Ok(id)
    }

    async fn copy_file(
        &self,
        token: &AccessToken,
        file_id: &str,
        name: &str,
        parent_id: &str,
    ) -> Result<String, ApiError> {
        let mut state = self.enter(token)?;
        let source_slides = state.file_mut(file_id)?.slides.len();
        let id = state.fresh_id("presentation");
        let slides = (0..source_slides).map(|_| state.fresh_id("slide")).collect();
        state.files.push(FileRecord {
            id: id.clone(),
            name: name.to_string(),
            parent: parent_id.to_string(),
            slides,
        });
        Ok(id)
    }

    async fn get_presentation(
        &self,
        token: &AccessToken,
        presentation_id: &str,
    ) -> Result<Presentation, ApiError> {
        let mut state = self.enter(token)?;
        let file = state.file_mut(presentation_id)?;
        Ok(Presentation {
            presentation_id: file.id.clone(),
            slides: file.slides.iter().map(|id| fake_page(id)).collect(),
        })
    }

    async fn batch_update(
        &self,
        token: &AccessToken,
        presentation_id: &str,
        requests: &[Request],
    ) -> Result<(), ApiError> {
        let mut state = self.enter(token)?;
        if let Some(err) = state.batch_failures.pop_front() {
            return Err(err);
        }
        let mut slides = state.file_mut(presentation_id)?.slides.clone();
        for request in requests {
            match request {
                Request::DeleteObject { object_id } => slides.retain(|s| s != object_id),
                Request::DuplicateObject { object_id } => {
                    if let Some(pos) = slides.iter().position(|s| s == object_id) {
                        let copy = state.fresh_id("slide");
                        slides.insert(pos + 1, copy);
                    }
                }
                _ => {}
            }
        }
        state.file_mut(presentation_id)?.slides = slides;
        state.batches.push(requests.to_vec());
        Ok(())
    }
}

/// Token provider that signs in instantly, or always asks for a redirect on web.
pub struct ScriptedTokenProvider {
    platform: Platform,
    logins: AtomicU32,
}

impl ScriptedTokenProvider {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            logins: AtomicU32::new(0),
        }
    }

    pub fn logins(&self) -> u32 {
        self.logins.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenProvider for ScriptedTokenProvider {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn initialize(&self) -> Result<(), AuthError> {
        Ok(())
    }

    async fn acquire(&self) -> Result<AccessToken, AuthError> {
        if self.platform == Platform::Web {
            return Err(AuthError::RedirectInProgress {
                consent_url: "https://accounts.google.com/o/oauth2/v2/auth?state=test".to_string(),
            });
        }
        let n = self.logins.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(AccessToken::expiring_in(
            format!("native-token-{n}"),
            Duration::from_secs(3600),
        ))
    }
}

#[derive(Default)]
pub struct MemoryPendingStore {
    slot: Mutex<Option<PendingOperation>>,
}

#[async_trait]
impl PendingOperationStore for MemoryPendingStore {
    async fn save(&self, operation: &PendingOperation) -> Result<(), PendingStoreError> {
        *self.slot.lock().unwrap() = Some(operation.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<PendingOperation>, PendingStoreError> {
        Ok(self.slot.lock().unwrap().clone())
    }

    async fn clear(&self) -> Result<(), PendingStoreError> {
        *self.slot.lock().unwrap() = None;
        Ok(())
    }
}
