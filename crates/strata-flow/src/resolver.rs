//! Execution-order resolution from implicit dependencies.
//!
//! No explicit DAG is declared anywhere: job A depends on job B exactly
//! when one of A's input names equals B's output name. The resolver builds
//! that adjacency once per run and topologically sorts it with three-color
//! depth-first marking over index arrays.
//!
//! A detected cycle does **not** fail the run. The resolver falls back to
//! the declared order (layer rank, then run-order hint, then declaration
//! order) and surfaces the cycle in [`ExecutionOrder::Degraded`] so callers
//! can branch on the outcome instead of string-matching error messages.
//! This keeps a pipeline with an accidental self-referencing name usable,
//! at the cost of ordering correctness inside the cycle.

use std::collections::HashMap;

use crate::job::JobSpec;

/// The resolver's outcome: a safe execution order, or the declared-order
/// fallback when the implicit graph turned out cyclic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOrder {
    /// Topologically sorted: every job follows the producers of its inputs.
    Ordered(Vec<JobSpec>),
    /// A cycle was detected; jobs carry the declared order instead.
    Degraded {
        /// Jobs in declared order.
        jobs: Vec<JobSpec>,
        /// Output names participating in the detected cycle, first
        /// repeated at the end.
        cycle: Vec<String>,
    },
}

impl ExecutionOrder {
    /// Returns the jobs in execution order.
    #[must_use]
    pub fn jobs(&self) -> &[JobSpec] {
        match self {
            Self::Ordered(jobs) | Self::Degraded { jobs, .. } => jobs,
        }
    }

    /// Consumes the order, returning the jobs.
    #[must_use]
    pub fn into_jobs(self) -> Vec<JobSpec> {
        match self {
            Self::Ordered(jobs) | Self::Degraded { jobs, .. } => jobs,
        }
    }

    /// Returns true if the resolver fell back to the declared order.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// Returns the detected cycle, if any.
    #[must_use]
    pub fn cycle(&self) -> Option<&[String]> {
        match self {
            Self::Ordered(_) => None,
            Self::Degraded { cycle, .. } => Some(cycle),
        }
    }
}

/// Three-color DFS marking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Resolves an execution order for one pipeline run.
///
/// The returned order is safe to execute serially; callers that
/// parallelize may use any schedule consistent with the same partial
/// order.
#[must_use]
#[tracing::instrument(skip_all, fields(job_count = jobs.len()))]
pub fn resolve_order(mut jobs: Vec<JobSpec>) -> ExecutionOrder {
    // Declared order: layer rank first, then the run-order hint (absent
    // sorts last), declaration order breaking ties via stable sort.
    jobs.sort_by_key(|job| (job.target_layer.rank(), job.run_order.unwrap_or(u32::MAX)));

    // Adjacency, built once: output name -> producing job index.
    let mut producer: HashMap<&str, usize> = HashMap::with_capacity(jobs.len());
    for (idx, job) in jobs.iter().enumerate() {
        if let Some(previous) = producer.insert(job.output_name.as_str(), idx) {
            tracing::warn!(
                output = %job.output_name,
                kept = previous,
                "multiple jobs declare the same output; dependencies resolve to the first"
            );
            producer.insert(job.output_name.as_str(), previous);
        }
    }

    let deps: Vec<Vec<usize>> = jobs
        .iter()
        .map(|job| {
            job.input_names
                .iter()
                .filter_map(|input| producer.get(input.as_str()).copied())
                .collect()
        })
        .collect();

    let mut marks = vec![Mark::Unvisited; jobs.len()];
    let mut stack = Vec::new();
    let mut order = Vec::with_capacity(jobs.len());

    for idx in 0..jobs.len() {
        if marks[idx] == Mark::Unvisited {
            if let Some(cycle) = visit(idx, &deps, &jobs, &mut marks, &mut stack, &mut order) {
                tracing::warn!(
                    cycle = ?cycle,
                    "dependency cycle detected; falling back to declared order"
                );
                return ExecutionOrder::Degraded { jobs, cycle };
            }
        }
    }

    let ordered = order.into_iter().map(|idx| jobs[idx].clone()).collect();
    ExecutionOrder::Ordered(ordered)
}

/// Depth-first visit with cycle capture.
///
/// Returns the cycle's output names (first repeated at the end) when one
/// is found, `None` otherwise. Dependencies are visited before the job
/// itself, so `order` receives a valid topological sequence.
fn visit(
    idx: usize,
    deps: &[Vec<usize>],
    jobs: &[JobSpec],
    marks: &mut [Mark],
    stack: &mut Vec<usize>,
    order: &mut Vec<usize>,
) -> Option<Vec<String>> {
    match marks[idx] {
        Mark::Done => return None,
        Mark::InProgress => {
            let start = stack.iter().position(|&i| i == idx).unwrap_or(0);
            let mut cycle: Vec<String> = stack[start..]
                .iter()
                .map(|&i| jobs[i].output_name.clone())
                .collect();
            cycle.push(jobs[idx].output_name.clone());
            return Some(cycle);
        }
        Mark::Unvisited => {}
    }

    marks[idx] = Mark::InProgress;
    stack.push(idx);
    for &dep in &deps[idx] {
        if let Some(cycle) = visit(dep, deps, jobs, marks, stack, order) {
            return Some(cycle);
        }
    }
    stack.pop();
    marks[idx] = Mark::Done;
    order.push(idx);
    None
}
