//! Client and conversation plumbing for the generative-image backend.
//!
//! Notes:
//! - Requests go over `reqwest` against the REST surface; bodies are built
//!   with `serde_json::json!` and responses parsed into typed structs.
//! - `reconcile` holds the history-reconciliation algorithm that makes a
//!   prior conversation safe to replay to a continuation-sensitive model.

mod client;
mod error;
mod reconcile;
mod router;
pub(crate) mod types;

pub use client::{GeminiClient, GenerateOptions};
pub use error::GenerationError;
pub use reconcile::{is_professional_label, reconcile_history, MAX_UPLOAD_ATTACHMENTS};
pub use router::{resolve_model, resolve_refinement_model};
pub use types::{
    InlineData, ModelKind, ModelResponse, Part, ProviderTurn, ResultImage, Speaker, Turn,
};
