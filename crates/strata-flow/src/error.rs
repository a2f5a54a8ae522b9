//! Error types for the pipeline domain.

use crate::gate::NotReadyInput;

/// The result type used throughout strata-flow.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A job's inputs are missing from the catalog or not yet consumable.
    ///
    /// `not_found` and `not_ready` are kept apart so operators can tell
    /// "this input never ran" from "this input ran and is failed or still
    /// running".
    #[error("inputs not satisfied for '{output}': missing {not_found:?}, not ready {not_ready:?}")]
    Dependency {
        /// The job output whose inputs were checked.
        output: String,
        /// Inputs with no catalog entry at all.
        not_found: Vec<String>,
        /// Inputs that exist but are not `READY`, with their statuses.
        not_ready: Vec<NotReadyInput>,
    },

    /// A key-based merge was requested without primary keys in strict mode.
    #[error("merge strategy for '{output}' requires primary keys")]
    MergeConflict {
        /// The job output being merged.
        output: String,
    },

    /// The external transform failed to produce the job's rows.
    #[error("transform failed: {message}")]
    Transform {
        /// Description of the failure.
        message: String,
    },

    /// An error from the catalog.
    #[error("catalog error: {0}")]
    Catalog(#[from] strata_catalog::Error),

    /// An error from strata-core.
    #[error("core error: {0}")]
    Core(#[from] strata_core::Error),
}

impl Error {
    /// Creates a new transform error.
    #[must_use]
    pub fn transform(message: impl Into<String>) -> Self {
        Self::Transform {
            message: message.into(),
        }
    }
}
