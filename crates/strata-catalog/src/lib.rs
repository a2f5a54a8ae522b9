//! # strata-catalog
//!
//! Dataset version catalog for the Strata lakehouse consistency engine.
//!
//! The catalog is the durable registry every other component reads and
//! writes: one entry per `(layer, qualified name, environment)` triple,
//! carrying the dataset's storage location, schema, lineage pointers, and a
//! status state machine that gates downstream consumption.
//!
//! ## Core Concepts
//!
//! - **Entry**: A dataset version's registration — where it lives, what it
//!   looks like, and what it was derived from
//! - **Status**: `PENDING → RUNNING → READY | FAILED`, with re-entry into
//!   `RUNNING` for rebuilds and retries
//! - **Store**: The injected repository capability (`upsert`, `set_status`,
//!   `resolve`); production deployments back it with a relational metadata
//!   store, tests use [`InMemoryCatalog`]
//!
//! ## Guarantees
//!
//! - At most one entry per `(layer, qualified name, environment)`
//! - Entries are never deleted by this crate; retention is external
//! - `upsert`/`set_status` are single-writer-per-key operations

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod entry;
pub mod error;
pub mod memory;
pub mod store;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::entry::{CatalogEntry, DatasetStatus, Layer};
    pub use crate::error::{Error, Result};
    pub use crate::memory::InMemoryCatalog;
    pub use crate::store::CatalogStore;
}

pub use entry::{CatalogEntry, DatasetStatus, Layer};
pub use error::{Error, Result};
pub use memory::InMemoryCatalog;
pub use store::CatalogStore;
