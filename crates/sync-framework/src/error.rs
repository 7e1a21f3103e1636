//! # Framework Errors
//!
//! This module defines the common error types used throughout the sync framework.
//! Domain crates wrap these in their own error enums (see `ActorClient::map_error`).

/// Errors that can occur within the sync framework itself.
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid range: {0}")]
    InvalidRange(String),
    #[error("Remote call failed: {0}")]
    Remote(String),
    #[error("Entity error: {0}")]
    EntityError(Box<dyn std::error::Error + Send + Sync>),
}
