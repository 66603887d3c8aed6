// The core module contains all business logic.
// Each feature gets its own submodule; ports are traits implemented in `infra`.

#[path = "ai/mod.rs"]
pub mod ai;

#[path = "slides/mod.rs"]
pub mod slides;

#[path = "presentation/mod.rs"]
pub mod presentation;
