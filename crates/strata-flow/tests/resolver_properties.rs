//! Property tests for execution-order resolution.

use std::collections::HashMap;

use proptest::prelude::*;

use strata_catalog::Layer;
use strata_flow::job::JobSpec;
use strata_flow::merge::MergeStrategy;
use strata_flow::resolver::resolve_order;

/// Builds jobs from a lower-triangular adjacency: job `i` may only read
/// outputs of jobs with a smaller index, which guarantees acyclicity.
fn jobs_from_adjacency(adjacency: &[Vec<bool>]) -> Vec<JobSpec> {
    adjacency
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let inputs: Vec<String> = row
                .iter()
                .take(i)
                .enumerate()
                .filter(|(_, &edge)| edge)
                .map(|(j, _)| format!("t{j}"))
                .collect();
            JobSpec::new(format!("t{i}"), Layer::Cleaned, MergeStrategy::Versioned)
                .with_inputs(inputs)
        })
        .collect()
}

proptest! {
    /// Any acyclic job set resolves to a full ordering that places every
    /// job after the producers of its inputs.
    #[test]
    fn acyclic_sets_resolve_to_a_valid_order(
        adjacency in prop::collection::vec(prop::collection::vec(any::<bool>(), 0..12), 1..12)
    ) {
        let jobs = jobs_from_adjacency(&adjacency);
        let job_count = jobs.len();
        let order = resolve_order(jobs);

        prop_assert!(!order.is_degraded());
        prop_assert_eq!(order.jobs().len(), job_count);

        let position: HashMap<&str, usize> = order
            .jobs()
            .iter()
            .enumerate()
            .map(|(pos, job)| (job.output_name.as_str(), pos))
            .collect();

        for job in order.jobs() {
            let own = position[job.output_name.as_str()];
            for input in &job.input_names {
                if let Some(&producer) = position.get(input.as_str()) {
                    prop_assert!(
                        producer < own,
                        "'{}' runs at {} but its producer '{}' runs at {}",
                        job.output_name, own, input, producer
                    );
                }
            }
        }
    }

    /// Resolution never loses or invents jobs, cyclic or not.
    #[test]
    fn resolution_preserves_the_job_set(
        adjacency in prop::collection::vec(prop::collection::vec(any::<bool>(), 0..12), 1..12),
        extra_edge in any::<bool>()
    ) {
        let mut jobs = jobs_from_adjacency(&adjacency);
        if extra_edge {
            // Possibly close a cycle: the first job reads the last output.
            let last = format!("t{}", jobs.len() - 1);
            jobs[0].input_names.push(last);
        }
        let mut declared: Vec<String> =
            jobs.iter().map(|j| j.output_name.clone()).collect();
        declared.sort();

        let order = resolve_order(jobs);
        let mut resolved: Vec<String> =
            order.jobs().iter().map(|j| j.output_name.clone()).collect();
        resolved.sort();

        prop_assert_eq!(declared, resolved);
    }
}
