//! Per-step execution accounting.

use std::time::Duration;

use strata_core::PatchId;

/// What one `execute` call did, for drivers and tests.
///
/// The execution order is the sequence of (task name, patch) node
/// completions; tests assert ordering properties against it rather than
/// poking at graph internals.
#[derive(Clone, Debug, Default)]
pub struct StepMetrics {
    /// Nodes run to completion.
    pub tasks_executed: usize,
    /// Ghost cells delivered ahead of readiness.
    pub ghost_cells_delivered: usize,
    /// Completion order of (task, patch) nodes.
    pub execution_order: Vec<(String, PatchId)>,
    /// Wall time for the whole step.
    pub elapsed: Duration,
}

impl StepMetrics {
    /// Position of a node in the completion order, if it ran.
    pub fn position(&self, task: &str, patch: PatchId) -> Option<usize> {
        self.execution_order
            .iter()
            .position(|(name, p)| name == task && *p == patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_finds_the_right_node() {
        let metrics = StepMetrics {
            tasks_executed: 2,
            execution_order: vec![
                ("a".to_string(), PatchId(0)),
                ("b".to_string(), PatchId(0)),
            ],
            ..StepMetrics::default()
        };
        assert_eq!(metrics.position("b", PatchId(0)), Some(1));
        assert_eq!(metrics.position("a", PatchId(1)), None);
    }
}
