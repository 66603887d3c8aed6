pub mod auth;
pub mod backend;
pub mod layout;
pub mod materializer_service;
pub mod pending;
pub mod presentation_models;
pub mod request_planner;
pub mod requests;

#[cfg(test)]
pub mod test_support;

pub use auth::{AccessToken, AuthError, AuthFlow, AuthSession, Platform, TokenProvider};
pub use backend::{ApiError, SlidesBackend};
pub use materializer_service::{MaterializeError, MaterializeStage, MaterializerService};
pub use pending::{
    PendingOperation, PendingOperationStore, PendingStoreError, PENDING_OPERATION_KEY,
};
pub use presentation_models::Presentation;
pub use requests::Request;
