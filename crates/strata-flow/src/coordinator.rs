//! Per-run composition of resolver, gate, quality engine, and merge engine.
//!
//! The coordinator executes resolver-ordered jobs sequentially within one
//! pipeline invocation: the catalog's `upsert`/`set_status` are
//! single-writer-per-key operations, and serial execution keeps two jobs of
//! the same run from racing on one entry. Jobs with no resolver-inferred
//! dependency between them *may* run concurrently, but that schedule is the
//! caller's choice, not this module's default.
//!
//! Failures are local to a job. A job whose upstream failed is still
//! attempted — the readiness gate rejects it with a dependency error, which
//! is the intended, diagnosable signal rather than a separate
//! short-circuit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use strata_catalog::{CatalogEntry, CatalogStore, DatasetStatus};
use strata_core::{Environment, ExecutionId, RowBatch, TableStore, VersionId};
use strata_quality::{QualityEngine, QualityRule};

use crate::error::{Error, Result};
use crate::gate::ReadinessReport;
use crate::job::JobSpec;
use crate::merge::{MergeEngine, MergeStrategy};
use crate::paths::DatasetPaths;
use crate::resolver::{resolve_order, ExecutionOrder};
use crate::runner::{JobRunner, ResolvedInput};

/// Supplies the active quality rules for a dataset.
///
/// Rules live in an external CRUD surface (HTTP service or direct store
/// access); the engine itself has no rule persistence.
#[async_trait]
pub trait RuleSource: Send + Sync {
    /// Returns the active rules for the dataset a job produces.
    async fn active_rules(&self, dataset: &str) -> Result<Vec<QualityRule>>;
}

/// Test rule source returning preconfigured rules per dataset.
///
/// Datasets with no configured rules get an empty rule set, which
/// evaluates every batch as clean.
#[derive(Debug, Default)]
pub struct StaticRuleSource {
    rules: HashMap<String, Vec<QualityRule>>,
}

impl StaticRuleSource {
    /// Creates a source with no rules configured.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the rules for a dataset (builder style).
    #[must_use]
    pub fn with_rules(mut self, dataset: impl Into<String>, rules: Vec<QualityRule>) -> Self {
        self.rules.insert(dataset.into(), rules);
        self
    }
}

#[async_trait]
impl RuleSource for StaticRuleSource {
    async fn active_rules(&self, dataset: &str) -> Result<Vec<QualityRule>> {
        Ok(self.rules.get(dataset).cloned().unwrap_or_default())
    }
}

/// Caller-facing knobs for one pipeline invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Jobs not started before this instant are recorded as not attempted.
    ///
    /// There is no cancellation of a job already underway; entries left
    /// `RUNNING` by an expired run are reclaimed by a later one.
    pub deadline: Option<DateTime<Utc>>,
}

/// Outcome of one job within a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// The job wrote its output and the catalog marks it ready.
    Succeeded,
    /// The job failed; its error is recorded and its output marked failed.
    Failed,
    /// The run's deadline expired before the job started.
    NotAttempted,
}

/// Per-job result reported back to the task runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    /// The job's output name.
    pub output_name: String,
    /// What happened.
    pub status: JobStatus,
    /// The failure, when there was one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Rows written, for succeeded jobs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_written: Option<usize>,
    /// Quality score of the incoming batch, for succeeded jobs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
    /// Version identifier of the write, for succeeded jobs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<VersionId>,
}

/// Overall pipeline outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStatus {
    /// Every job succeeded.
    Succeeded,
    /// At least one job failed or was not attempted.
    Failed,
}

/// The full report of one pipeline invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    /// Correlation ID stamped on every catalog write of this run.
    pub execution_id: ExecutionId,
    /// Environment the run executed in.
    pub environment: Environment,
    /// Overall outcome.
    pub status: PipelineStatus,
    /// True when the resolver fell back to the declared order.
    pub degraded_order: bool,
    /// The detected dependency cycle, when the order degraded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle: Option<Vec<String>>,
    /// Per-job results, in execution order.
    pub jobs: Vec<JobResult>,
}

/// Outcome of polling for upstream readiness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Every polled input became ready.
    Ready,
    /// At least one input was observed `FAILED`.
    ///
    /// Distinct from a timeout: the upstream ran and failed.
    Failed {
        /// The failed inputs.
        failed: Vec<String>,
    },
    /// The timeout expired with inputs still pending.
    ///
    /// The upstream may still complete later; this is not a failure
    /// observation.
    TimedOut {
        /// Inputs that were not yet ready at the deadline.
        pending: Vec<String>,
    },
}

/// What a successful job run produced.
struct JobOutcome {
    rows_written: usize,
    quality_score: f64,
    version: VersionId,
}

/// Composes the consistency engine per pipeline run.
pub struct PipelineCoordinator<C, T, R, S> {
    catalog: C,
    tables: T,
    runner: R,
    rules: S,
    quality: QualityEngine,
    merge: MergeEngine,
}

impl<C, T, R, S> PipelineCoordinator<C, T, R, S>
where
    C: CatalogStore,
    T: TableStore,
    R: JobRunner,
    S: RuleSource,
{
    /// Creates a coordinator with default quality and merge engines.
    #[must_use]
    pub fn new(catalog: C, tables: T, runner: R, rules: S) -> Self {
        Self {
            catalog,
            tables,
            runner,
            rules,
            quality: QualityEngine::new(),
            merge: MergeEngine::new(),
        }
    }

    /// Overrides the quality engine (builder style).
    #[must_use]
    pub fn with_quality_engine(mut self, quality: QualityEngine) -> Self {
        self.quality = quality;
        self
    }

    /// Overrides the merge engine (builder style).
    #[must_use]
    pub fn with_merge_engine(mut self, merge: MergeEngine) -> Self {
        self.merge = merge;
        self
    }

    /// Executes one pipeline run.
    ///
    /// Jobs run sequentially in resolver order. Per-job failures are
    /// recorded and do not stop execution of the remaining jobs.
    #[tracing::instrument(skip(self, jobs), fields(environment = %environment, job_count = jobs.len()))]
    pub async fn execute(
        &self,
        jobs: Vec<JobSpec>,
        environment: &Environment,
        options: RunOptions,
    ) -> PipelineReport {
        let execution_id = ExecutionId::generate();
        let order = resolve_order(jobs);
        let (degraded_order, cycle) = match &order {
            ExecutionOrder::Ordered(_) => (false, None),
            ExecutionOrder::Degraded { cycle, .. } => (true, Some(cycle.clone())),
        };

        let mut results = Vec::with_capacity(order.jobs().len());
        for job in order.jobs() {
            if options.deadline.is_some_and(|deadline| Utc::now() >= deadline) {
                tracing::warn!(output = %job.output_name, "run deadline expired; job not attempted");
                results.push(JobResult {
                    output_name: job.output_name.clone(),
                    status: JobStatus::NotAttempted,
                    error: None,
                    rows_written: None,
                    quality_score: None,
                    version: None,
                });
                continue;
            }

            match self.run_job(job, environment, execution_id).await {
                Ok(outcome) => {
                    tracing::info!(
                        output = %job.output_name,
                        rows = outcome.rows_written,
                        "job succeeded"
                    );
                    results.push(JobResult {
                        output_name: job.output_name.clone(),
                        status: JobStatus::Succeeded,
                        error: None,
                        rows_written: Some(outcome.rows_written),
                        quality_score: Some(outcome.quality_score),
                        version: Some(outcome.version),
                    });
                }
                Err(error) => {
                    tracing::error!(output = %job.output_name, %error, "job failed");
                    if let Err(status_error) = self
                        .catalog
                        .set_status(
                            &job.output_name,
                            environment,
                            DatasetStatus::Failed,
                            Some(execution_id),
                        )
                        .await
                    {
                        tracing::warn!(
                            output = %job.output_name,
                            %status_error,
                            "could not mark output failed"
                        );
                    }
                    results.push(JobResult {
                        output_name: job.output_name.clone(),
                        status: JobStatus::Failed,
                        error: Some(error.to_string()),
                        rows_written: None,
                        quality_score: None,
                        version: None,
                    });
                }
            }
        }

        let status = if results.iter().all(|r| r.status == JobStatus::Succeeded) {
            PipelineStatus::Succeeded
        } else {
            PipelineStatus::Failed
        };

        PipelineReport {
            execution_id,
            environment: environment.clone(),
            status,
            degraded_order,
            cycle,
            jobs: results,
        }
    }

    /// Runs one job end to end: gate, transform, quality, merge, write,
    /// catalog update.
    async fn run_job(
        &self,
        job: &JobSpec,
        environment: &Environment,
        execution_id: ExecutionId,
    ) -> Result<JobOutcome> {
        // Claim the output first; unknown outputs are a logged no-op.
        self.catalog
            .set_status(
                &job.output_name,
                environment,
                DatasetStatus::Running,
                Some(execution_id),
            )
            .await?;

        // One batch lookup backs both the readiness check and the input
        // locations, so the job sees a single catalog snapshot.
        let entries = self.catalog.resolve(&job.input_names, environment).await?;
        ReadinessReport::assess(&job.input_names, &entries).ensure(&job.output_name)?;

        let mut inputs = Vec::with_capacity(job.input_names.len());
        for name in &job.input_names {
            let entry = entries.get(name).cloned().ok_or_else(|| Error::transform(
                format!("input '{name}' vanished between readiness check and read"),
            ))?;
            let rows = self.tables.read_batch(&entry.location).await?;
            inputs.push(ResolvedInput {
                name: name.clone(),
                entry,
                rows,
            });
        }

        let incoming = self.runner.execute(job, &inputs).await?;

        let rules = self.rules.active_rules(&job.output_name).await?;
        let report = self.quality.evaluate(&incoming, &rules);
        let surviving = report.apply_quarantine(&incoming);

        let prior = self.prior_snapshot(job, environment).await?;
        let plan = self.merge.apply(
            job.merge_strategy,
            &surviving,
            prior.as_ref(),
            &job.primary_keys,
            &job.output_name,
        )?;

        let paths = DatasetPaths::new(job.target_layer, &job.output_name);
        let location = match job.merge_strategy {
            MergeStrategy::Versioned => paths.versioned_key(plan.version),
            MergeStrategy::Replace | MergeStrategy::Merge => paths.current_key(),
        };

        // Archive-then-write: the displaced artifact must be safe before
        // the overwrite starts.
        if plan.archive_prior && self.tables.exists(&location).await? {
            let archive = paths.archive_key(Utc::now());
            self.tables.copy(&location, &archive).await?;
            tracing::info!(from = %location, to = %archive, "archived prior artifact");
        }

        let byte_size = self.tables.write_batch(&location, &plan.rows).await?;

        let mut entry = CatalogEntry::new(
            job.target_layer,
            &job.output_name,
            environment.clone(),
            &location,
            plan.rows.schema().clone(),
        )
        .with_status(DatasetStatus::Running)
        .with_parents(job.input_names.iter().cloned())
        .with_size(plan.rows.len() as u64, byte_size);
        entry.last_execution_id = Some(execution_id);

        self.catalog.upsert(entry).await?;
        self.catalog
            .set_status(
                &job.output_name,
                environment,
                DatasetStatus::Ready,
                Some(execution_id),
            )
            .await?;

        Ok(JobOutcome {
            rows_written: plan.rows.len(),
            quality_score: report.quality_score,
            version: plan.version,
        })
    }

    /// Reads the prior snapshot for a key-based merge.
    ///
    /// Only the `merge` strategy consults prior data. A cataloged output
    /// whose artifact is missing from storage counts as no prior.
    async fn prior_snapshot(
        &self,
        job: &JobSpec,
        environment: &Environment,
    ) -> Result<Option<RowBatch>> {
        if job.merge_strategy != MergeStrategy::Merge {
            return Ok(None);
        }
        let Some(entry) = self
            .catalog
            .get(job.target_layer, &job.output_name, environment)
            .await?
        else {
            return Ok(None);
        };
        if !self.tables.exists(&entry.location).await? {
            return Ok(None);
        }
        Ok(Some(self.tables.read_batch(&entry.location).await?))
    }

    /// Polls the catalog until the inputs are ready, one fails, or the
    /// timeout expires.
    ///
    /// The gate itself never waits; this is the explicit polling surface
    /// for callers coordinating with an asynchronously-running upstream
    /// pipeline. A timeout is a distinct outcome from an observed failure:
    /// the upstream may still complete later.
    ///
    /// # Errors
    ///
    /// Returns an error only when the catalog lookup itself fails.
    pub async fn wait_for_ready(
        &self,
        names: &[String],
        environment: &Environment,
        timeout: Duration,
        interval: Duration,
    ) -> Result<WaitOutcome> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let entries = self.catalog.resolve(names, environment).await?;
            let report = ReadinessReport::assess(names, &entries);

            if report.all_ready {
                return Ok(WaitOutcome::Ready);
            }

            let failed: Vec<String> = report
                .not_ready
                .iter()
                .filter(|input| input.status == DatasetStatus::Failed)
                .map(|input| input.name.clone())
                .collect();
            if !failed.is_empty() {
                return Ok(WaitOutcome::Failed { failed });
            }

            if tokio::time::Instant::now() >= deadline {
                let mut pending = report.not_found;
                pending.extend(report.not_ready.into_iter().map(|input| input.name));
                return Ok(WaitOutcome::TimedOut { pending });
            }

            tokio::time::sleep(interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::StaticRunner;
    use strata_catalog::{InMemoryCatalog, Layer};
    use strata_core::{Field, MemoryTableStore, Schema, SemanticType};

    fn coordinator(
        catalog: InMemoryCatalog,
    ) -> PipelineCoordinator<InMemoryCatalog, MemoryTableStore, StaticRunner, StaticRuleSource>
    {
        PipelineCoordinator::new(
            catalog,
            MemoryTableStore::new(),
            StaticRunner::new(),
            StaticRuleSource::new(),
        )
    }

    async fn seed_ready(catalog: &InMemoryCatalog, name: &str, status: DatasetStatus) {
        let env = Environment::new("prod");
        catalog
            .upsert(CatalogEntry::new(
                Layer::Cleaned,
                name,
                env.clone(),
                format!("cleaned/{name}/current"),
                Schema::new(vec![Field::new("id", SemanticType::Integer)]),
            ))
            .await
            .unwrap();
        catalog
            .set_status(name, &env, DatasetStatus::Running, None)
            .await
            .unwrap();
        if status != DatasetStatus::Running {
            catalog.set_status(name, &env, status, None).await.unwrap();
        }
    }

    #[tokio::test]
    async fn wait_for_ready_returns_ready_immediately() {
        let catalog = InMemoryCatalog::new();
        seed_ready(&catalog, "t1", DatasetStatus::Ready).await;
        let coordinator = coordinator(catalog);

        let outcome = coordinator
            .wait_for_ready(
                &["t1".to_string()],
                &Environment::new("prod"),
                Duration::from_millis(50),
                Duration::from_millis(5),
            )
            .await
            .unwrap();
        assert_eq!(outcome, WaitOutcome::Ready);
    }

    #[tokio::test]
    async fn wait_for_ready_reports_observed_failure() {
        let catalog = InMemoryCatalog::new();
        seed_ready(&catalog, "t2", DatasetStatus::Failed).await;
        let coordinator = coordinator(catalog);

        let outcome = coordinator
            .wait_for_ready(
                &["t2".to_string()],
                &Environment::new("prod"),
                Duration::from_millis(50),
                Duration::from_millis(5),
            )
            .await
            .unwrap();
        assert_eq!(
            outcome,
            WaitOutcome::Failed {
                failed: vec!["t2".to_string()]
            }
        );
    }

    #[tokio::test]
    async fn wait_for_ready_times_out_on_pending_inputs() {
        let catalog = InMemoryCatalog::new();
        seed_ready(&catalog, "t3", DatasetStatus::Running).await;
        let coordinator = coordinator(catalog);

        let outcome = coordinator
            .wait_for_ready(
                &["t3".to_string(), "ghost".to_string()],
                &Environment::new("prod"),
                Duration::from_millis(20),
                Duration::from_millis(5),
            )
            .await
            .unwrap();
        match outcome {
            WaitOutcome::TimedOut { pending } => {
                assert!(pending.contains(&"t3".to_string()));
                assert!(pending.contains(&"ghost".to_string()));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn static_rule_source_defaults_to_no_rules() {
        let source = StaticRuleSource::new();
        let rules = source.active_rules("anything").await.unwrap();
        assert!(rules.is_empty());
    }

    #[tokio::test]
    async fn expired_deadline_marks_jobs_not_attempted() {
        let catalog = InMemoryCatalog::new();
        let coordinator = coordinator(catalog);
        let env = Environment::new("prod");

        let jobs = vec![JobSpec::new(
            "orders_cleaned",
            Layer::Cleaned,
            MergeStrategy::Replace,
        )];
        let options = RunOptions {
            deadline: Some(Utc::now() - chrono::Duration::seconds(1)),
        };
        let report = coordinator.execute(jobs, &env, options).await;

        assert_eq!(report.status, PipelineStatus::Failed);
        assert_eq!(report.jobs[0].status, JobStatus::NotAttempted);
        assert!(report.jobs[0].error.is_none());
    }
}
