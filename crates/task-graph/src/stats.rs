//! Registry statistics.

use crate::{Priority, TaskKind, TaskPlanner};
use indexmap::IndexMap;
use serde::Serialize;

/// Summary counts over the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatistics {
    /// Number of tasks.
    pub total_tasks: usize,
    /// Task count per kind, only kinds that occur.
    pub tasks_by_type: IndexMap<TaskKind, usize>,
    /// Task count per priority, only priorities that occur.
    pub tasks_by_priority: IndexMap<Priority, usize>,
    /// Tasks with at least one prerequisite.
    pub tasks_with_dependencies: usize,
    /// Tasks with at least one deliverable.
    pub tasks_with_deliverables: usize,
    /// Mean duration of tasks with a positive duration, rounded half up.
    pub average_duration: u64,
    /// Sum of all durations.
    pub total_estimated_duration: u64,
}

impl TaskPlanner {
    /// Compute registry statistics.
    #[must_use]
    pub fn statistics(&self) -> TaskStatistics {
        let mut by_type: IndexMap<TaskKind, usize> = IndexMap::new();
        let mut by_priority: IndexMap<Priority, usize> = IndexMap::new();
        let mut with_deliverables = 0;
        let mut total: u64 = 0;
        let mut positive_sum: u64 = 0;
        let mut positive_count: u64 = 0;

        for task in self.tasks() {
            *by_type.entry(task.kind()).or_default() += 1;
            *by_priority.entry(task.priority).or_default() += 1;
            if !task.deliverables.is_empty() {
                with_deliverables += 1;
            }
            total = total.saturating_add(task.estimated_duration);
            if task.estimated_duration > 0 {
                positive_sum = positive_sum.saturating_add(task.estimated_duration);
                positive_count += 1;
            }
        }
        by_type.sort_keys();
        by_priority.sort_keys();

        let average_duration = if positive_count == 0 {
            0
        } else {
            positive_sum.saturating_add(positive_count / 2) / positive_count
        };

        TaskStatistics {
            total_tasks: self.len(),
            tasks_by_type: by_type,
            tasks_by_priority: by_priority,
            tasks_with_dependencies: self.index.forward().len(),
            tasks_with_deliverables: with_deliverables,
            average_duration,
            total_estimated_duration: total,
        }
    }
}
