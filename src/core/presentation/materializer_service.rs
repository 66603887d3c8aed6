// Turns a list of slide drafts into a live Google Slides deck:
// client init -> auth -> folders -> template clone -> slide count -> content.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::auth::{AccessToken, AuthError, AuthSession, TokenProvider};
use super::backend::{edit_url, ApiError, SlidesBackend, DRIVE_ROOT};
use super::layout::generate_object_id;
use super::pending::{PendingOperation, PendingOperationStore, PendingStoreError};
use super::request_planner::{plan_deck_content, plan_slide_count};
use crate::core::slides::{MaterializationTarget, SlideDraft};

/// Maximum requests per `batchUpdate` call.
pub const BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterializeStage {
    Uninitialized,
    ClientInitialized,
    AuthResolved,
    FolderResolved,
    TemplateCloned,
    SlideCountAdjusted,
    ContentPopulated,
    Done,
}

#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("No template configured. Set GOOGLE_SLIDES_TEMPLATE_ID.")]
    MissingTemplateConfig,
    /// Control flow, not a failure. Callers should send the user to
    /// `consent_url` and show nothing else.
    #[error("REDIRECTING_FOR_AUTH")]
    AuthRedirectInProgress { consent_url: String },
    #[error("{0}")]
    AuthDenied(String),
    #[error("Google sign-in expired: {0}")]
    AuthExpired(ApiError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("There are no slides to create.")]
    NoUsableContent,
    #[error("The template presentation has no slides.")]
    TemplateHasNoSlides,
    #[error(transparent)]
    PendingStore(#[from] PendingStoreError),
}

impl MaterializeError {
    pub fn is_redirect(&self) -> bool {
        matches!(self, MaterializeError::AuthRedirectInProgress { .. })
    }

    fn from_retry(err: MaterializeError) -> Self {
        match err {
            MaterializeError::Api(api) if api.is_auth_failure() => MaterializeError::AuthExpired(api),
            other => other,
        }
    }
}

impl From<AuthError> for MaterializeError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::RedirectInProgress { consent_url } => {
                MaterializeError::AuthRedirectInProgress { consent_url }
            }
            AuthError::Denied(message) => MaterializeError::AuthDenied(message),
            AuthError::Setup(message) => MaterializeError::AuthDenied(message),
        }
    }
}

pub struct MaterializerService<B, T, S>
where
    B: SlidesBackend,
    T: TokenProvider,
    S: PendingOperationStore,
{
    backend: B,
    auth: T,
    session: Arc<AuthSession>,
    pending: S,
    template_id: Option<String>,
}

impl<B, T, S> MaterializerService<B, T, S>
where
    B: SlidesBackend,
    T: TokenProvider,
    S: PendingOperationStore,
{
    pub fn new(
        backend: B,
        auth: T,
        session: Arc<AuthSession>,
        pending: S,
        template_id: Option<String>,
    ) -> Self {
        Self {
            backend,
            auth,
            session,
            pending,
            template_id,
        }
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    pub fn token_provider(&self) -> &T {
        &self.auth
    }

    /// Creates a new deck from `slides` and returns its edit URL.
    ///
    /// Every call clones a fresh copy of the template; only the folder
    /// lookup is idempotent.
    pub async fn materialize(
        &self,
        slides: &[SlideDraft],
        target: &MaterializationTarget,
    ) -> Result<String, MaterializeError> {
        let template_id = self
            .template_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(MaterializeError::MissingTemplateConfig)?;
        if slides.is_empty() {
            return Err(MaterializeError::NoUsableContent);
        }

        let target = target.sanitized();
        let mut stage = MaterializeStage::Uninitialized;
        let result = self
            .run(&mut stage, template_id, slides, &target)
            .await;

        match &result {
            Ok(url) => info!(%url, slides = slides.len(), "Presentation created"),
            Err(e) if e.is_redirect() => info!("Waiting for Google consent before creating slides"),
            Err(e) => error!(?stage, error = %e, "Failed to create presentation"),
        }
        result
    }

    /// Re-runs a request that was parked for a consent redirect.
    /// Returns `Ok(None)` when nothing is parked.
    pub async fn resume_pending(&self) -> Result<Option<String>, MaterializeError> {
        let Some(operation) = self.pending.load().await? else {
            return Ok(None);
        };
        info!(
            title = %operation.presentation_title,
            saved_at = %operation.saved_at,
            "Resuming pending presentation request"
        );
        self.materialize(&operation.slide_data, &operation.target())
            .await
            .map(Some)
    }

    async fn run(
        &self,
        stage: &mut MaterializeStage,
        template_id: &str,
        slides: &[SlideDraft],
        target: &MaterializationTarget,
    ) -> Result<String, MaterializeError> {
        self.backend.initialize().await?;
        self.auth.initialize().await?;
        *stage = MaterializeStage::ClientInitialized;

        let token = match self.session.ensure_token(&self.auth).await {
            Ok(token) => token,
            Err(AuthError::RedirectInProgress { consent_url }) => {
                self.pending
                    .save(&PendingOperation::new(slides, target))
                    .await?;
                return Err(MaterializeError::AuthRedirectInProgress { consent_url });
            }
            Err(e) => return Err(e.into()),
        };
        *stage = MaterializeStage::AuthResolved;

        let prepared: Vec<SlideDraft> = slides
            .iter()
            .enumerate()
            .map(|(i, slide)| slide.prepared(i + 1))
            .collect();

        let mut copied = None;
        let presentation_id = match self
            .build_deck(stage, &mut copied, &token, template_id, &prepared, target)
            .await
        {
            Err(MaterializeError::Api(api)) if api.is_auth_failure() => {
                if let Some(abandoned) = copied.take() {
                    warn!(presentation_id = %abandoned, "Leaving partially built presentation behind");
                }
                if !self.auth.retries_on_auth_failure() {
                    self.session.begin_flow().await.invalidate().await;
                    return Err(MaterializeError::AuthExpired(api));
                }
                warn!(error = %api, "Access token rejected, signing in again");
                let token = self.session.reacquire(&self.auth).await?;
                *stage = MaterializeStage::AuthResolved;
                self.build_deck(stage, &mut copied, &token, template_id, &prepared, target)
                    .await
                    .map_err(MaterializeError::from_retry)?
            }
            other => other?,
        };

        if let Err(e) = self.pending.clear().await {
            warn!(error = %e, "Failed to clear pending presentation request");
        }
        *stage = MaterializeStage::Done;
        Ok(edit_url(&presentation_id))
    }

    async fn build_deck(
        &self,
        stage: &mut MaterializeStage,
        copied: &mut Option<String>,
        token: &AccessToken,
        template_id: &str,
        slides: &[SlideDraft],
        target: &MaterializationTarget,
    ) -> Result<String, MaterializeError> {
        let subject_folder = self
            .resolve_folder(token, &target.subject_name, DRIVE_ROOT)
            .await?;
        let unit_folder = self
            .resolve_folder(token, &target.unit_name, &subject_folder)
            .await?;
        *stage = MaterializeStage::FolderResolved;

        let presentation_id = self
            .backend
            .copy_file(token, template_id, &target.presentation_title, &unit_folder)
            .await?;
        *copied = Some(presentation_id.clone());
        let cloned = self.backend.get_presentation(token, &presentation_id).await?;
        *stage = MaterializeStage::TemplateCloned;
        debug!(%presentation_id, template_slides = cloned.slides.len(), "Template cloned");

        if cloned.slides.is_empty() {
            return Err(MaterializeError::TemplateHasNoSlides);
        }
        let count_plan = plan_slide_count(&cloned.slides, slides.len());
        if !count_plan.deletions.is_empty() {
            self.backend
                .batch_update(token, &presentation_id, &count_plan.deletions)
                .await?;
        }
        if !count_plan.duplications.is_empty() {
            self.backend
                .batch_update(token, &presentation_id, &count_plan.duplications)
                .await?;
        }
        // Duplicates get server-assigned ids, so re-read the deck.
        let deck = self.backend.get_presentation(token, &presentation_id).await?;
        *stage = MaterializeStage::SlideCountAdjusted;

        let requests = plan_deck_content(&deck.slides, slides, generate_object_id);
        for (index, batch) in requests.chunks(BATCH_SIZE).enumerate() {
            debug!(batch = index + 1, size = batch.len(), "Sending slide content batch");
            self.backend
                .batch_update(token, &presentation_id, batch)
                .await?;
        }
        *stage = MaterializeStage::ContentPopulated;

        Ok(presentation_id)
    }

    async fn resolve_folder(
        &self,
        token: &AccessToken,
        name: &str,
        parent_id: &str,
    ) -> Result<String, ApiError> {
        if let Some(id) = self.backend.find_folder(token, name, parent_id).await? {
            return Ok(id);
        }
        info!(folder = name, "Creating Drive folder");
        self.backend.create_folder(token, name, parent_id).await
    }
}
