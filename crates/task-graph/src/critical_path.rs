//! Critical path method over the task graph.
//!
//! The forward pass computes earliest start and finish times in dependency
//! order, the backward pass latest times in reverse order. Tasks with zero
//! total float form the critical path. Durations are integers, so float is
//! compared exactly.

use crate::{Result, TaskPlanner};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

/// Schedule of one task, in day units from project start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskTiming {
    /// Earliest start.
    pub earliest_start: u64,
    /// Earliest finish.
    pub earliest_finish: u64,
    /// Latest start that does not delay the project.
    pub latest_start: u64,
    /// Latest finish that does not delay the project.
    pub latest_finish: u64,
    /// Slack: latest start minus earliest start.
    pub total_float: u64,
}

impl TaskTiming {
    /// Whether the task has no slack.
    #[must_use]
    pub const fn is_critical(&self) -> bool {
        self.total_float == 0
    }
}

/// A task on the critical path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalTask {
    /// Task id.
    pub id: String,
    /// Task name.
    pub name: String,
    /// Its schedule.
    #[serde(flatten)]
    pub timing: TaskTiming,
}

/// Result of the critical path computation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalPathReport {
    /// Latest earliest-finish over all tasks; 0 for an empty registry.
    pub project_duration: u64,
    /// Zero-float tasks in dependency order.
    pub critical_tasks: Vec<CriticalTask>,
    /// Ids of the zero-float tasks in dependency order.
    pub critical_path: Vec<String>,
    /// Schedule of every task, in registration order.
    pub timings: IndexMap<String, TaskTiming>,
    /// Total float of every task, in registration order.
    pub total_float: IndexMap<String, u64>,
}

impl TaskPlanner {
    /// Compute earliest and latest times, float and the critical path.
    ///
    /// Dangling prerequisites count as finished at time 0.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::CycleDetected`] if the graph is not acyclic.
    pub fn critical_path(&self) -> Result<CriticalPathReport> {
        let order = self.sorted_positions()?;
        let tasks: Vec<_> = self.tasks.values().collect();
        debug_assert_eq!(order.len(), tasks.len());

        let mut timings = vec![TaskTiming::default(); tasks.len()];

        for &position in &order {
            let task = tasks[position];
            let earliest_start = self
                .index
                .prerequisites(&task.id)
                .iter()
                .filter_map(|p| self.position(p))
                .map(|p| timings[p].earliest_finish)
                .max()
                .unwrap_or(0);
            let timing = &mut timings[position];
            timing.earliest_start = earliest_start;
            timing.earliest_finish = earliest_start.saturating_add(task.estimated_duration);
        }

        let project_duration = timings
            .iter()
            .map(|t| t.earliest_finish)
            .max()
            .unwrap_or(0);

        for &position in order.iter().rev() {
            let task = tasks[position];
            let latest_finish = self
                .index
                .dependents(&task.id)
                .iter()
                .filter_map(|d| self.position(d))
                .map(|d| timings[d].latest_start)
                .min()
                .unwrap_or(project_duration);
            let timing = &mut timings[position];
            timing.latest_finish = latest_finish;
            timing.latest_start = latest_finish.saturating_sub(task.estimated_duration);
            timing.total_float = timing.latest_start.saturating_sub(timing.earliest_start);
        }

        let critical_tasks: Vec<CriticalTask> = order
            .iter()
            .filter(|&&position| timings[position].is_critical())
            .map(|&position| CriticalTask {
                id: tasks[position].id.clone(),
                name: tasks[position].name.clone(),
                timing: timings[position],
            })
            .collect();
        let critical_path = critical_tasks.iter().map(|t| t.id.clone()).collect();

        let report = CriticalPathReport {
            project_duration,
            critical_path,
            timings: tasks
                .iter()
                .zip(&timings)
                .map(|(task, timing)| (task.id.clone(), *timing))
                .collect(),
            total_float: tasks
                .iter()
                .zip(&timings)
                .map(|(task, timing)| (task.id.clone(), timing.total_float))
                .collect(),
            critical_tasks,
        };
        debug!(
            duration = report.project_duration,
            critical = report.critical_path.len(),
            "computed critical path"
        );
        Ok(report)
    }
}
