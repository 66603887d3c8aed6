// Lesson content to Google Slides.
//
// **Architecture Overview:**
// - `core/` = Business logic (drafting, request planning, auth session) and the
//   traits it needs from the outside world
// - `infra/` = Implementations of core traits (Gemini/OpenRouter, Google REST,
//   token providers, pending-request stores)
// - `config` = Environment configuration
//
// The binary in `main.rs` is the composition root.

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
pub mod core;
#[path = "infra/infra_layer.rs"]
pub mod infra;

pub mod config;
