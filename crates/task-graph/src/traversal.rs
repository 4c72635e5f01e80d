//! Execution ordering for the task graph.
//!
//! Orders put prerequisites before the tasks that depend on them. Dangling
//! prerequisites do not constrain the order.

use crate::{Error, Result, TaskPlanner};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Task ids in an order where every prerequisite comes before its
/// dependents.
pub type TopologicalOrder = Vec<String>;

/// Groups of task ids that can execute in parallel.
///
/// The outer vector is ordered by dependency level: every task in group N
/// only depends on tasks in groups before N.
pub type ExecutionLevels = Vec<Vec<String>>;

impl TaskPlanner {
    /// Kahn's algorithm over registration positions.
    ///
    /// The ready set is ordered by position, so among all tasks whose
    /// prerequisites are done the earliest registered is emitted first.
    pub(crate) fn sorted_positions(&self) -> Result<Vec<usize>> {
        let ids: Vec<&str> = self.ids().collect();
        let mut in_degree: Vec<usize> = ids
            .iter()
            .map(|id| {
                self.index
                    .prerequisites(id)
                    .iter()
                    .filter(|p| self.contains(p))
                    .count()
            })
            .collect();

        let mut ready: BTreeSet<usize> = (0..ids.len()).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(ids.len());

        while let Some(next) = ready.pop_first() {
            order.push(next);
            for dependent in self.index.dependents(ids[next]) {
                let Some(position) = self.position(dependent) else {
                    continue;
                };
                in_degree[position] = in_degree[position].saturating_sub(1);
                if in_degree[position] == 0 {
                    ready.insert(position);
                }
            }
        }

        if order.len() < ids.len() {
            let cycles = self.detect_cycles();
            warn!(
                ordered = order.len(),
                total = ids.len(),
                "topological sort stopped early"
            );
            return Err(Error::cycle_detected(cycles));
        }
        debug!(tasks = order.len(), "computed topological order");
        Ok(order)
    }

    /// Task ids in dependency order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CycleDetected`] listing every cycle if the graph is
    /// not acyclic. The order is never truncated.
    pub fn topological_order(&self) -> Result<TopologicalOrder> {
        Ok(self
            .sorted_positions()?
            .into_iter()
            .filter_map(|position| self.tasks.get_index(position))
            .map(|(id, _)| id.clone())
            .collect())
    }

    /// Group tasks by dependency depth.
    ///
    /// A task's level is one more than the highest level among its existing
    /// prerequisites, or 0 without any. Tasks within a level are listed in
    /// registration order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CycleDetected`] if the graph is not acyclic.
    pub fn execution_levels(&self) -> Result<ExecutionLevels> {
        let order = self.sorted_positions()?;
        let mut level_of = vec![0usize; self.len()];
        let mut levels: Vec<Vec<usize>> = Vec::new();

        for position in order {
            let Some((id, _)) = self.tasks.get_index(position) else {
                continue;
            };
            let level = self
                .index
                .prerequisites(id)
                .iter()
                .filter_map(|p| self.position(p))
                .map(|p| level_of[p] + 1)
                .max()
                .unwrap_or(0);
            level_of[position] = level;
            if level >= levels.len() {
                levels.resize(level + 1, Vec::new());
            }
            levels[level].push(position);
        }

        Ok(levels
            .into_iter()
            .map(|mut group| {
                group.sort_unstable();
                group
                    .into_iter()
                    .filter_map(|position| self.tasks.get_index(position))
                    .map(|(id, _)| id.clone())
                    .collect()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Error, NewTask, TaskPlanner};

    fn planner(edges: &[(&str, &[&str])]) -> TaskPlanner {
        let mut planner = TaskPlanner::default();
        for (id, deps) in edges {
            planner
                .add(NewTask::new(*id).with_id(*id).depends_on(deps.iter().copied()))
                .unwrap();
        }
        planner
    }

    fn assert_valid_order(planner: &TaskPlanner, order: &[String]) {
        assert_eq!(order.len(), planner.len());
        let positions: std::collections::HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();
        for task in planner.tasks() {
            for dep in &task.dependencies {
                if let Some(&p) = positions.get(dep.as_str()) {
                    assert!(p < positions[task.id.as_str()], "{dep} must precede {}", task.id);
                }
            }
        }
    }

    #[test]
    fn test_prerequisites_come_first() {
        let planner = planner(&[("c", &["b"]), ("b", &["a"]), ("a", &[])]);
        let order = planner.topological_order().unwrap();
        assert_eq!(order, ["a", "b", "c"]);
        assert_valid_order(&planner, &order);
    }

    #[test]
    fn test_registration_order_breaks_ties() {
        let planner = planner(&[
            ("x", &["late"]),
            ("y", &[]),
            ("late", &[]),
            ("z", &[]),
        ]);
        // y is ready before late, and x becomes ready after late while z
        // is still waiting; x was registered first.
        assert_eq!(planner.topological_order().unwrap(), ["y", "late", "x", "z"]);
    }

    #[test]
    fn test_dangling_prerequisites_are_ignored() {
        let planner = planner(&[("b", &["a", "ghost"]), ("a", &[])]);
        assert_eq!(planner.topological_order().unwrap(), ["a", "b"]);
    }

    #[test]
    fn test_cycle_is_an_error() {
        let planner = planner(&[("a", &[]), ("b", &["c"]), ("c", &["b"])]);
        let err = planner.topological_order().unwrap_err();
        match err {
            Error::CycleDetected { cycles } => {
                assert_eq!(cycles, vec![vec!["b".to_string(), "c".to_string()]]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(planner.execution_levels().unwrap_err().is_cycle());
    }

    #[test]
    fn test_empty_planner() {
        let planner = TaskPlanner::default();
        assert!(planner.topological_order().unwrap().is_empty());
        assert!(planner.execution_levels().unwrap().is_empty());
    }

    #[test]
    fn test_execution_levels_diamond() {
        let planner = planner(&[
            ("d", &["b", "c"]),
            ("c", &["a"]),
            ("b", &["a"]),
            ("a", &[]),
            ("e", &[]),
        ]);
        let levels = planner.execution_levels().unwrap();
        assert_eq!(
            levels,
            vec![
                vec!["a".to_string(), "e".to_string()],
                vec!["c".to_string(), "b".to_string()],
                vec!["d".to_string()],
            ]
        );
    }
}
