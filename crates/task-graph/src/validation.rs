//! One-shot structural check of the task graph.
//!
//! Cycles make a graph invalid. Dangling prerequisites are reported but
//! tolerated, since every pass treats them as finished at time 0.

use crate::{Error, TaskPlanner};
use serde::Serialize;

/// A prerequisite edge pointing at a task that is not registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DanglingEdge {
    /// The task listing the prerequisite.
    pub task: String,
    /// The missing prerequisite id.
    pub missing: String,
}

/// Result of graph validation.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the graph is valid (no cycles).
    pub is_valid: bool,
    /// List of validation errors, if any.
    pub errors: Vec<Error>,
    /// Dangling edges. These are warnings, not errors.
    pub dangling_edges: Vec<DanglingEdge>,
}

impl ValidationResult {
    /// Create a valid result.
    #[must_use]
    pub fn valid(dangling_edges: Vec<DanglingEdge>) -> Self {
        Self {
            is_valid: true,
            errors: vec![],
            dangling_edges,
        }
    }

    /// Create an invalid result with errors.
    #[must_use]
    pub fn invalid(errors: Vec<Error>, dangling_edges: Vec<DanglingEdge>) -> Self {
        Self {
            is_valid: false,
            errors,
            dangling_edges,
        }
    }
}

impl TaskPlanner {
    /// Validate the graph structure.
    ///
    /// Checks for:
    /// - Cycles in the dependency graph (errors)
    /// - Prerequisites that are not registered (warnings)
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        let dangling = self.dangling_edges();
        let cycles = self.detect_cycles();

        if cycles.is_empty() {
            ValidationResult::valid(dangling)
        } else {
            ValidationResult::invalid(vec![Error::cycle_detected(cycles)], dangling)
        }
    }

    /// Every `(task, missing prerequisite)` pair, in registration order.
    #[must_use]
    pub fn dangling_edges(&self) -> Vec<DanglingEdge> {
        self.tasks()
            .flat_map(|task| {
                self.index
                    .prerequisites(&task.id)
                    .iter()
                    .filter(move |dep| !self.contains(dep))
                    .map(move |dep| DanglingEdge {
                        task: task.id.clone(),
                        missing: dep.clone(),
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NewTask;

    fn planner(edges: &[(&str, &[&str])]) -> TaskPlanner {
        let mut planner = TaskPlanner::default();
        for (id, deps) in edges {
            planner
                .add(NewTask::new(*id).with_id(*id).depends_on(deps.iter().copied()))
                .unwrap();
        }
        planner
    }

    #[test]
    fn test_validate_empty_graph() {
        let result = TaskPlanner::default().validate();
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert!(result.dangling_edges.is_empty());
    }

    #[test]
    fn test_validate_valid_graph() {
        let result = planner(&[("a", &[]), ("b", &["a"])]).validate();
        assert!(result.is_valid);
    }

    #[test]
    fn test_validate_cyclic_graph() {
        let result = planner(&[("a", &["b"]), ("b", &["a"])]).validate();
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].is_cycle());
    }

    #[test]
    fn test_dangling_edges_are_warnings() {
        let mut planner = planner(&[("a", &[]), ("b", &["a", "ghost"])]);
        planner.remove("a");

        let result = planner.validate();
        assert!(result.is_valid);
        assert_eq!(
            result.dangling_edges,
            [
                DanglingEdge {
                    task: "b".into(),
                    missing: "a".into()
                },
                DanglingEdge {
                    task: "b".into(),
                    missing: "ghost".into()
                },
            ]
        );
    }
}
