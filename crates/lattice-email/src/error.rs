//! Error types for the email queue.

use thiserror::Error;

/// Email queue operation errors.
#[derive(Debug, Error)]
pub enum EmailError {
    /// The recipient is on the suppression list.
    #[error("address is suppressed")]
    Suppressed,

    /// Queued email not found.
    #[error("Email not found: {0}")]
    NotFound(String),

    /// A field failed validation (priority out of range, empty recipient).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database failure.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
