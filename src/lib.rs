//! Core services for an image-generation/editing studio: preset-driven
//! creation, conversational refinement with history reconciliation, model
//! routing, and bounded local history.
//!
//! The visual layer is a separate front-end; this crate exposes the
//! orchestrators (`services::creation`, `services::refine`), the provider
//! client (`services::gemini`), and the persistence layer (`history`).

pub mod history;
pub mod services;

pub use history::{HistoryStore, CREATION_LOG_CAPACITY, REFINEMENT_LOG_CAPACITY};
pub use services::config::{load_studio_config, StudioConfig};
pub use services::creation::{create_content, CreationResult};
pub use services::gemini::{
    GeminiClient, GenerationError, InlineData, ModelKind, Part, ResultImage, Turn,
};
pub use services::refine::{Conversation, RefineReply, RefineSession};
