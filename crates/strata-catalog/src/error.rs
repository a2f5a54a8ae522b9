//! Error types for the catalog domain.

/// The result type used throughout strata-catalog.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An invalid status transition was attempted.
    #[error("invalid status transition: {from} -> {to} ({reason})")]
    InvalidStateTransition {
        /// The current status.
        from: String,
        /// The attempted target status.
        to: String,
        /// The reason the transition is invalid.
        reason: String,
    },

    /// A storage operation failed.
    #[error("catalog storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An error from strata-core.
    #[error("core error: {0}")]
    Core(#[from] strata_core::Error),
}

impl Error {
    /// Creates a new storage error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }
}
