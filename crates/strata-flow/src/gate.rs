//! Readiness gating ahead of job execution.
//!
//! The gate is consulted immediately before a job runs — after resolver
//! ordering, so true dependencies from the same run should already be
//! `READY`. It never waits or polls; callers that want to wait for an
//! asynchronously-running upstream use the coordinator's polling helper.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use strata_catalog::{CatalogEntry, CatalogStore, DatasetStatus};
use strata_core::Environment;

use crate::error::{Error, Result};

/// An input that exists in the catalog but is not consumable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotReadyInput {
    /// The input's qualified name.
    pub name: String,
    /// Its current status.
    pub status: DatasetStatus,
}

/// Triage of a job's declared inputs.
///
/// `not_found` and `not_ready` are deliberately separate: "this input never
/// ran" and "this input ran and failed" call for different operator
/// responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessReport {
    /// True when every input is `READY`.
    pub all_ready: bool,
    /// Inputs that are `READY`, in declared order.
    pub ready: Vec<String>,
    /// Inputs that exist but are not `READY`, with their statuses.
    pub not_ready: Vec<NotReadyInput>,
    /// Inputs with no catalog entry.
    pub not_found: Vec<String>,
}

impl ReadinessReport {
    /// Triages inputs against already-resolved catalog entries.
    ///
    /// Pure: performs no catalog access. The map comes from one batch
    /// `resolve` call so the job sees a single consistent snapshot.
    #[must_use]
    pub fn assess(inputs: &[String], entries: &BTreeMap<String, CatalogEntry>) -> Self {
        let mut ready = Vec::new();
        let mut not_ready = Vec::new();
        let mut not_found = Vec::new();

        for name in inputs {
            match entries.get(name) {
                None => not_found.push(name.clone()),
                Some(entry) if entry.status.is_consumable() => ready.push(name.clone()),
                Some(entry) => not_ready.push(NotReadyInput {
                    name: name.clone(),
                    status: entry.status,
                }),
            }
        }

        Self {
            all_ready: not_ready.is_empty() && not_found.is_empty(),
            ready,
            not_ready,
            not_found,
        }
    }

    /// Converts a non-ready report into the job-fatal dependency error.
    ///
    /// # Errors
    ///
    /// Returns `Error::Dependency` enumerating both sets unless everything
    /// is ready.
    pub fn ensure(&self, output: &str) -> Result<()> {
        if self.all_ready {
            return Ok(());
        }
        Err(Error::Dependency {
            output: output.to_string(),
            not_found: self.not_found.clone(),
            not_ready: self.not_ready.clone(),
        })
    }
}

/// Checks declared inputs against the catalog.
pub struct ReadinessGate<'a, C: CatalogStore + ?Sized> {
    catalog: &'a C,
}

impl<'a, C: CatalogStore + ?Sized> ReadinessGate<'a, C> {
    /// Creates a gate over the given catalog.
    #[must_use]
    pub const fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// Resolves and triages the inputs in one batch lookup.
    ///
    /// # Errors
    ///
    /// Returns an error only when the catalog itself fails; missing or
    /// not-ready inputs are reported in the result, not as errors.
    pub async fn check_ready(
        &self,
        inputs: &[String],
        environment: &Environment,
    ) -> Result<ReadinessReport> {
        let entries = self.catalog.resolve(inputs, environment).await?;
        Ok(ReadinessReport::assess(inputs, &entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_catalog::{InMemoryCatalog, Layer};
    use strata_core::{Field, Schema, SemanticType};

    async fn seeded_catalog() -> InMemoryCatalog {
        let catalog = InMemoryCatalog::new();
        let env = Environment::new("prod");
        let schema = Schema::new(vec![Field::new("id", SemanticType::Integer)]);

        // t1: ready
        catalog
            .upsert(CatalogEntry::new(
                Layer::Cleaned,
                "t1",
                env.clone(),
                "cleaned/t1/current",
                schema.clone(),
            ))
            .await
            .unwrap();
        catalog
            .set_status("t1", &env, DatasetStatus::Running, None)
            .await
            .unwrap();
        catalog
            .set_status("t1", &env, DatasetStatus::Ready, None)
            .await
            .unwrap();

        // t2: failed
        catalog
            .upsert(CatalogEntry::new(
                Layer::Cleaned,
                "t2",
                env.clone(),
                "cleaned/t2/current",
                schema,
            ))
            .await
            .unwrap();
        catalog
            .set_status("t2", &env, DatasetStatus::Running, None)
            .await
            .unwrap();
        catalog
            .set_status("t2", &env, DatasetStatus::Failed, None)
            .await
            .unwrap();

        catalog
    }

    #[tokio::test]
    async fn triages_ready_failed_and_missing() {
        let catalog = seeded_catalog().await;
        let env = Environment::new("prod");
        let gate = ReadinessGate::new(&catalog);

        let inputs = vec!["t1".to_string(), "t2".to_string(), "t3".to_string()];
        let report = gate.check_ready(&inputs, &env).await.unwrap();

        assert!(!report.all_ready);
        assert_eq!(report.ready, vec!["t1".to_string()]);
        assert_eq!(
            report.not_ready,
            vec![NotReadyInput {
                name: "t2".to_string(),
                status: DatasetStatus::Failed,
            }]
        );
        assert_eq!(report.not_found, vec!["t3".to_string()]);
    }

    #[tokio::test]
    async fn all_ready_when_every_input_is_consumable() {
        let catalog = seeded_catalog().await;
        let env = Environment::new("prod");
        let gate = ReadinessGate::new(&catalog);

        let inputs = vec!["t1".to_string()];
        let report = gate.check_ready(&inputs, &env).await.unwrap();
        assert!(report.all_ready);
        assert!(report.ensure("anything").is_ok());
    }

    #[tokio::test]
    async fn ensure_surfaces_both_sets() {
        let catalog = seeded_catalog().await;
        let env = Environment::new("prod");
        let gate = ReadinessGate::new(&catalog);

        let inputs = vec!["t2".to_string(), "t3".to_string()];
        let report = gate.check_ready(&inputs, &env).await.unwrap();
        let err = report.ensure("daily_totals").unwrap_err();

        match err {
            Error::Dependency {
                output,
                not_found,
                not_ready,
            } => {
                assert_eq!(output, "daily_totals");
                assert_eq!(not_found, vec!["t3".to_string()]);
                assert_eq!(not_ready.len(), 1);
                assert_eq!(not_ready[0].status, DatasetStatus::Failed);
            }
            other => panic!("expected dependency error, got {other}"),
        }
    }

    #[tokio::test]
    async fn empty_input_list_is_trivially_ready() {
        let catalog = InMemoryCatalog::new();
        let env = Environment::new("prod");
        let gate = ReadinessGate::new(&catalog);

        let report = gate.check_ready(&[], &env).await.unwrap();
        assert!(report.all_ready);
    }
}
