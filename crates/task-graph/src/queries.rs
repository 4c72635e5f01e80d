//! Dependency queries on a single task.
//!
//! Unknown ids yield empty results. Transitive queries walk the indices with
//! an explicit stack, so long chains are fine.

use crate::{RiskAssessment, Task, TaskPlanner, TaskTiming};
use indexmap::IndexSet;
use serde::Serialize;
use tracing::warn;

/// Everything known about one task.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskReport {
    /// The task itself.
    #[serde(flatten)]
    pub task: Task,
    /// Listed prerequisites.
    pub direct_dependencies: Vec<String>,
    /// Prerequisites at any depth.
    pub all_dependencies: Vec<String>,
    /// Tasks listing this one as a prerequisite.
    pub reverse_dependencies: Vec<String>,
    /// Tasks depending on this one at any depth.
    pub all_dependents: Vec<String>,
    /// Prerequisite paths from this task down to tasks without prerequisites.
    pub dependency_chains: Vec<Vec<String>>,
    /// Risk score.
    pub risk: RiskAssessment,
    /// Schedule, absent when the graph has cycles.
    pub timing: Option<TaskTiming>,
}

impl TaskPlanner {
    /// Prerequisites listed by `id`.
    #[must_use]
    pub fn direct_dependencies(&self, id: &str) -> Vec<String> {
        self.index.prerequisites(id).to_vec()
    }

    /// Prerequisites of `id` at any depth, depth first in listed order,
    /// without repeats and without `id` itself.
    ///
    /// Dangling prerequisites are included but have nothing below them.
    #[must_use]
    pub fn all_dependencies(&self, id: &str) -> Vec<String> {
        self.walk(id, |node| self.index.prerequisites(node))
    }

    /// Tasks that list `id` as a prerequisite.
    ///
    /// Also answers for ids that are no longer registered but still have
    /// dependents pointing at them.
    #[must_use]
    pub fn reverse_dependencies(&self, id: &str) -> Vec<String> {
        self.index.dependents(id).to_vec()
    }

    /// Tasks depending on `id` at any depth, without repeats.
    #[must_use]
    pub fn all_dependents(&self, id: &str) -> Vec<String> {
        self.walk(id, |node| self.index.dependents(node))
    }

    fn walk<'a>(&'a self, id: &str, next: impl Fn(&str) -> &'a [String]) -> Vec<String> {
        let mut seen: IndexSet<&str> = IndexSet::new();
        let mut stack: Vec<&str> = next(id).iter().rev().map(String::as_str).collect();

        while let Some(node) = stack.pop() {
            if node == id || !seen.insert(node) {
                continue;
            }
            stack.extend(next(node).iter().rev().map(String::as_str));
        }
        seen.into_iter().map(String::from).collect()
    }

    /// Every prerequisite path from `id` down to a task without
    /// prerequisites.
    ///
    /// Each chain starts with `id`. A branch that would revisit a task already
    /// on its path is abandoned. At most `maxDependencyChains` chains are
    /// returned.
    #[must_use]
    pub fn dependency_chains(&self, id: &str) -> Vec<Vec<String>> {
        if !self.contains(id) {
            return Vec::new();
        }
        let limit = self.config.max_dependency_chains;
        let mut chains: Vec<Vec<String>> = Vec::new();
        let mut path: Vec<&str> = vec![id];
        let mut cursors: Vec<usize> = vec![0];

        while let (Some(&node), Some(&cursor)) = (path.last(), cursors.last()) {
            let prerequisites = self.index.prerequisites(node);
            if prerequisites.is_empty() {
                if chains.len() >= limit {
                    warn!(task = id, limit, "dependency chain enumeration truncated");
                    break;
                }
                chains.push(path.iter().map(|s| (*s).to_string()).collect());
                path.pop();
                cursors.pop();
                continue;
            }
            let Some(dep) = prerequisites.get(cursor) else {
                path.pop();
                cursors.pop();
                continue;
            };
            if let Some(top) = cursors.last_mut() {
                *top += 1;
            }
            if !path.contains(&dep.as_str()) {
                path.push(dep);
                cursors.push(0);
            }
        }
        chains
    }

    /// Detail bundle for one task. `None` for an unknown id.
    #[must_use]
    pub fn task_report(&self, id: &str) -> Option<TaskReport> {
        let task = self.get(id)?.clone();
        let timing = self
            .critical_path()
            .ok()
            .and_then(|report| report.timings.get(id).copied());
        Some(TaskReport {
            direct_dependencies: self.direct_dependencies(id),
            all_dependencies: self.all_dependencies(id),
            reverse_dependencies: self.reverse_dependencies(id),
            all_dependents: self.all_dependents(id),
            dependency_chains: self.dependency_chains(id),
            risk: self.assess(id)?,
            timing,
            task,
        })
    }
}
