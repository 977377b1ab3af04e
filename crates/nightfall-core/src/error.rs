//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
///
/// None of these halt a running game: they reject one moderator action and
/// leave the session exactly as it was.
#[derive(Debug, Error)]
pub enum DomainError {
    /// No game session exists (or not the requested one).
    #[error("game session not found: {0}")]
    SessionNotFound(Uuid),

    /// The action is not legal in the current phase.
    #[error("invalid phase: expected {expected}, found {actual}")]
    InvalidPhase {
        /// Phase(s) the action is legal in.
        expected: String,
        /// Phase the session is currently in.
        actual: String,
    },

    /// A moderator selection was rejected (dead target, wrong slot, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// A persistence or configuration backend failed.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
