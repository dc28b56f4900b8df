//! Durable history: capped image logs and per-field input history.

mod error;
mod store;

pub use error::HistoryError;
pub use store::{
    BoundedImageLog, HistoryStore, CREATION_LOG_CAPACITY, REFINEMENT_LOG_CAPACITY,
};
