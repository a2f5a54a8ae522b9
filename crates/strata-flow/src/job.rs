//! Job specifications.

use serde::{Deserialize, Serialize};

use strata_catalog::Layer;

use crate::merge::MergeStrategy;

/// A declared transform job.
///
/// Jobs carry no explicit dependency edges. A job depends on another
/// exactly when one of its `input_names` equals the other's `output_name`;
/// inputs produced outside the current run must already be `READY` in the
/// catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSpec {
    /// Qualified name of the dataset this job produces.
    pub output_name: String,
    /// Layer the output lands in.
    pub target_layer: Layer,
    /// Qualified names of the datasets this job reads, in declared order.
    #[serde(default)]
    pub input_names: Vec<String>,
    /// Optional ordering hint among jobs of the same layer.
    ///
    /// Jobs without a hint sort after jobs with one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_order: Option<u32>,
    /// How new rows fold into the existing dataset.
    pub merge_strategy: MergeStrategy,
    /// Key columns for the `merge` strategy.
    #[serde(default)]
    pub primary_keys: Vec<String>,
}

impl JobSpec {
    /// Creates a job with no inputs, no ordering hint, and no primary keys.
    #[must_use]
    pub fn new(
        output_name: impl Into<String>,
        target_layer: Layer,
        merge_strategy: MergeStrategy,
    ) -> Self {
        Self {
            output_name: output_name.into(),
            target_layer,
            input_names: Vec::new(),
            run_order: None,
            merge_strategy,
            primary_keys: Vec::new(),
        }
    }

    /// Sets the declared inputs (builder style).
    #[must_use]
    pub fn with_inputs(mut self, inputs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.input_names = inputs.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the ordering hint (builder style).
    #[must_use]
    pub const fn with_run_order(mut self, order: u32) -> Self {
        self.run_order = Some(order);
        self
    }

    /// Sets the primary-key columns (builder style).
    #[must_use]
    pub fn with_primary_keys(
        mut self,
        keys: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.primary_keys = keys.into_iter().map(Into::into).collect();
        self
    }
}
