//! # strata-core
//!
//! Core abstractions for the Strata lakehouse consistency engine.
//!
//! This crate provides the foundational types and traits used across all
//! Strata components:
//!
//! - **Identifiers**: Strongly-typed IDs for executions and dataset versions
//! - **Values**: The scalar value model rows are made of, with a canonical
//!   encoding for key matching
//! - **Schemas and Batches**: The semantic table surface (ordered columns,
//!   typed values) the engine manipulates — never physical file formats
//! - **Storage Trait**: Abstract batch I/O over opaque locations
//! - **Error Types**: Shared error definitions and result types
//!
//! ## Crate Boundary
//!
//! `strata-core` is the **only** crate allowed to define shared primitives.
//! All cross-component interaction happens via the contracts defined here.
//!
//! ## Example
//!
//! ```rust
//! use strata_core::prelude::*;
//!
//! // Correlate a pipeline invocation
//! let execution = ExecutionId::generate();
//!
//! // Identify a dataset version
//! let version = VersionId::generate();
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod batch;
pub mod environment;
pub mod error;
pub mod id;
pub mod observability;
pub mod schema;
pub mod storage;
pub mod value;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use strata_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::batch::{Row, RowBatch};
    pub use crate::environment::Environment;
    pub use crate::error::{Error, Result};
    pub use crate::id::{ExecutionId, VersionId};
    pub use crate::schema::{Field, Schema, SemanticType};
    pub use crate::storage::{MemoryTableStore, TableStore};
    pub use crate::value::ScalarValue;
}

// Re-export key types at crate root for ergonomics
pub use batch::{Row, RowBatch};
pub use environment::Environment;
pub use error::{Error, Result};
pub use id::{ExecutionId, VersionId};
pub use observability::{init_logging, LogFormat};
pub use schema::{Field, Schema, SemanticType};
pub use storage::{MemoryTableStore, TableStore};
pub use value::ScalarValue;
