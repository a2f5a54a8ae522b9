//! Deterministic storage-key layout for dataset artifacts.
//!
//! All key derivation lives here instead of inline format strings, so the
//! layout can change in exactly one place. Keys are opaque to the engine;
//! the external tabular engine maps them to physical storage.
//!
//! ```text
//! {layer}/{name}/current                      fixed identity (replace/merge)
//! {layer}/{name}/versions/{version}           immutable versioned writes
//! {layer}/{name}/archive/{YYYYMMDD_HHMMSS}    archived prior artifacts
//! ```

use chrono::{DateTime, Utc};

use strata_catalog::Layer;
use strata_core::VersionId;

/// Key derivation for one dataset.
#[derive(Debug, Clone)]
pub struct DatasetPaths {
    layer: Layer,
    name: String,
}

impl DatasetPaths {
    /// Creates the key layout for a dataset.
    #[must_use]
    pub fn new(layer: Layer, name: impl Into<String>) -> Self {
        Self {
            layer,
            name: name.into(),
        }
    }

    /// Key of the fixed "current" artifact.
    #[must_use]
    pub fn current_key(&self) -> String {
        format!("{}/{}/current", self.layer.as_str(), self.name)
    }

    /// Key of an immutable versioned artifact.
    #[must_use]
    pub fn versioned_key(&self, version: VersionId) -> String {
        format!("{}/{}/versions/{version}", self.layer.as_str(), self.name)
    }

    /// Timestamped archive key for a displaced current artifact.
    #[must_use]
    pub fn archive_key(&self, at: DateTime<Utc>) -> String {
        format!(
            "{}/{}/archive/{}",
            self.layer.as_str(),
            self.name,
            at.format("%Y%m%d_%H%M%S")
        )
    }
}
