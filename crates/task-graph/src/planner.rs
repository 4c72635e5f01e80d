//! The task registry.
//!
//! [`TaskPlanner`] owns every task and the [`DependencyIndex`] derived from
//! them. Each mutating method updates both before it returns, so readers
//! never see an index that disagrees with the registry.

use crate::import::{ImportPayload, ImportSummary};
use crate::normalize::{MAX_DURATION, Normalizer, dedup_ids};
use crate::{
    DependencyIndex, DuplicatePolicy, Error, NewTask, PlannerConfig, Result, Task, TaskPatch,
};
use chrono::Utc;
use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Task dependency planner.
///
/// Tasks are kept in registration order, which is also the tie-break order
/// of every derived report.
#[derive(Debug, Clone, Default)]
pub struct TaskPlanner {
    pub(crate) config: PlannerConfig,
    pub(crate) tasks: IndexMap<String, Task>,
    pub(crate) index: DependencyIndex,
}

impl TaskPlanner {
    /// Create an empty planner.
    #[must_use]
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            config,
            tasks: IndexMap::new(),
            index: DependencyIndex::new(),
        }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Replace the whole registry with the contents of `payload`.
    ///
    /// Records without an id get `"{kind}-{n}"`, skipping ids that the
    /// payload uses explicitly, so importing the same payload twice yields
    /// the same registry. The new registry and its indices are built before
    /// the old ones are dropped.
    pub fn import_all(&mut self, payload: &ImportPayload) -> ImportSummary {
        let mut summary = ImportSummary::default();
        let mut records: Vec<(&'static str, NewTask)> = Vec::with_capacity(payload.len());

        for (collection, kind, values) in payload.collections() {
            summary
                .by_collection
                .insert(collection.to_string(), values.len());
            for (position, value) in values.iter().enumerate() {
                let mut normalizer = Normalizer::new(format!("{collection}[{position}]"));
                let mut task = normalizer.new_task(value, kind);
                task.id = task
                    .id
                    .map(|id| id.trim().to_string())
                    .filter(|id| !id.is_empty());
                summary.notes.extend(normalizer.into_notes());
                records.push((kind.as_str(), task));
            }
        }

        let explicit: IndexSet<String> = records
            .iter()
            .filter_map(|(_, task)| task.id.clone())
            .collect();
        let mut counters: IndexMap<&str, usize> = IndexMap::new();
        let now = Utc::now();
        let mut tasks: IndexMap<String, Task> = IndexMap::with_capacity(records.len());

        for (prefix, mut task) in records {
            let id = match task.id.take() {
                Some(id) => id,
                None => {
                    let counter = counters.entry(prefix).or_insert(0);
                    let id = loop {
                        *counter += 1;
                        let candidate = format!("{prefix}-{counter}");
                        if !explicit.contains(&candidate) {
                            break candidate;
                        }
                    };
                    summary.generated_ids.push(id.clone());
                    id
                }
            };

            if tasks.contains_key(&id) {
                warn!(
                    task = %id,
                    policy = ?self.config.duplicate_policy,
                    "duplicate task id in payload"
                );
                if !summary.duplicate_ids.contains(&id) {
                    summary.duplicate_ids.push(id.clone());
                }
                if self.config.duplicate_policy == DuplicatePolicy::Reject {
                    continue;
                }
            }
            tasks.insert(id.clone(), task.into_task(id, now));
        }

        let index = DependencyIndex::rebuild(tasks.iter().map(|(id, task)| (id.as_str(), task)));
        self.tasks = tasks;
        self.index = index;

        summary.imported = self.tasks.len();
        info!(
            tasks = summary.imported,
            edges = self.index.edge_count(),
            generated = summary.generated_ids.len(),
            duplicates = summary.duplicate_ids.len(),
            "imported task payload"
        );
        summary
    }

    /// Import from an already parsed JSON value.
    pub fn import_value(&mut self, value: &Value) -> ImportSummary {
        self.import_all(&ImportPayload::from_value(value))
    }

    /// Import from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Payload`] if the text is not valid JSON. The registry
    /// is left untouched in that case.
    pub fn import_json(&mut self, text: &str) -> Result<ImportSummary> {
        let payload = ImportPayload::from_json(text)?;
        Ok(self.import_all(&payload))
    }

    /// Insert one task and return its id.
    ///
    /// A missing or blank id is replaced with a generated one. Under
    /// [`DuplicatePolicy::Overwrite`] an existing task with the same id is
    /// replaced in place and keeps its creation time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateTask`] if the id is taken and the policy is
    /// [`DuplicatePolicy::Reject`].
    pub fn add(&mut self, mut new: NewTask) -> Result<String> {
        let id = new
            .id
            .take()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("task-{}", Uuid::new_v4()));

        new.dependencies = dedup_ids(std::mem::take(&mut new.dependencies));
        new.estimated_duration = new.estimated_duration.min(MAX_DURATION);

        let now = Utc::now();
        let mut task = new.into_task(id.clone(), now);
        if let Some(existing) = self.tasks.get(&id) {
            if self.config.duplicate_policy == DuplicatePolicy::Reject {
                return Err(Error::DuplicateTask { id });
            }
            warn!(task = %id, "overwriting existing task");
            task.created_at = existing.created_at;
        }

        self.index.relink(&id, &task.dependencies);
        self.tasks.insert(id.clone(), task);
        debug!(task = %id, total = self.tasks.len(), "added task");
        Ok(id)
    }

    /// Normalise a JSON record and insert it. Records without a `type`
    /// become general tasks.
    ///
    /// # Errors
    ///
    /// Same as [`TaskPlanner::add`].
    pub fn add_value(&mut self, value: &Value) -> Result<String> {
        let new = Normalizer::new("add").new_task(value, crate::TaskKind::General);
        self.add(new)
    }

    /// Merge `patch` onto the task `id`. Returns `false` if there is no such
    /// task.
    pub fn update(&mut self, id: &str, patch: &TaskPatch) -> bool {
        let Some(current) = self.tasks.get(id) else {
            debug!(task = id, "update of unknown task ignored");
            return false;
        };

        let mut task = current.clone();
        patch.apply_to(&mut task);
        task.estimated_duration = task.estimated_duration.min(MAX_DURATION);
        task.updated_at = Utc::now();

        if patch.changes_dependencies() {
            task.dependencies = dedup_ids(std::mem::take(&mut task.dependencies));
            self.index.relink(id, &task.dependencies);
        }
        self.tasks.insert(id.to_string(), task);
        true
    }

    /// Normalise the fields present in a JSON object and merge them onto the
    /// task `id`.
    pub fn update_value(&mut self, id: &str, value: &Value) -> bool {
        let patch = Normalizer::new(id).patch(value);
        self.update(id, &patch)
    }

    /// Delete the task `id` and the edges it owns.
    ///
    /// Tasks that depend on it keep their now dangling prerequisite, and the
    /// reverse index keeps a bucket for `id` listing them until they drop the
    /// edge. [`reverse_index`](Self::reverse_index) can therefore contain ids
    /// that are no longer registered.
    pub fn remove(&mut self, id: &str) -> bool {
        if self.tasks.shift_remove(id).is_none() {
            return false;
        }
        self.index.forget(id);
        let orphaned = self.index.dependents(id).len();
        if orphaned > 0 {
            debug!(task = id, dependents = orphaned, "removed task still has dependents");
        }
        true
    }

    /// Remove every task.
    pub fn clear(&mut self) {
        self.tasks.clear();
        self.index = DependencyIndex::new();
    }

    /// Look up a task.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// Snapshot of every task in registration order.
    #[must_use]
    pub fn all(&self) -> Vec<Task> {
        self.tasks.values().cloned().collect()
    }

    /// Iterate the tasks in registration order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Iterate task ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    /// Number of registered tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Whether a task with this id is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.tasks.contains_key(id)
    }

    /// The dependency indices.
    #[must_use]
    pub const fn dependency_index(&self) -> &DependencyIndex {
        &self.index
    }

    /// Copy of the forward index (task to prerequisites).
    #[must_use]
    pub fn forward_index(&self) -> IndexMap<String, Vec<String>> {
        self.index.forward().clone()
    }

    /// Copy of the reverse index (prerequisite to dependents).
    #[must_use]
    pub fn reverse_index(&self) -> IndexMap<String, Vec<String>> {
        self.index.reverse().clone()
    }

    pub(crate) fn position(&self, id: &str) -> Option<usize> {
        self.tasks.get_index_of(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Priority, TaskKind};
    use serde_json::json;

    fn planner_with(tasks: &[(&str, &[&str])]) -> TaskPlanner {
        let mut planner = TaskPlanner::default();
        for (id, deps) in tasks {
            planner
                .add(NewTask::new(*id).with_id(*id).depends_on(deps.iter().copied()))
                .unwrap();
        }
        planner
    }

    #[test]
    fn test_add_assigns_id_and_links() {
        let mut planner = planner_with(&[("a", &[])]);
        let id = planner
            .add(NewTask::new("anonymous").depends_on(["a"]))
            .unwrap();
        assert!(id.starts_with("task-"));
        assert_eq!(planner.dependency_index().dependents("a"), [id.clone()]);
        assert!(planner.dependency_index().is_symmetric());

        let blank = planner.add(NewTask::new("blank").with_id("  ")).unwrap();
        assert_ne!(blank, id);
        assert_eq!(planner.len(), 3);
    }

    #[test]
    fn test_overwrite_keeps_position_and_created_at() {
        let mut planner = planner_with(&[("a", &[]), ("b", &["a"]), ("c", &[])]);
        let created = planner.get("b").unwrap().created_at;

        planner
            .add(NewTask::new("b2").with_id("b").depends_on(["c"]))
            .unwrap();

        assert_eq!(planner.ids().collect::<Vec<_>>(), ["a", "b", "c"]);
        assert_eq!(planner.get("b").unwrap().name, "b2");
        assert_eq!(planner.get("b").unwrap().created_at, created);
        assert!(planner.dependency_index().dependents("a").is_empty());
        assert_eq!(planner.dependency_index().dependents("c"), ["b"]);
        assert!(planner.dependency_index().is_symmetric());
    }

    #[test]
    fn test_reject_policy() {
        let mut planner = TaskPlanner::new(PlannerConfig {
            duplicate_policy: DuplicatePolicy::Reject,
            ..PlannerConfig::default()
        });
        planner.add(NewTask::new("first").with_id("x")).unwrap();
        let err = planner
            .add(NewTask::new("second").with_id("x").depends_on(["y"]))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateTask { ref id } if id == "x"));
        assert_eq!(planner.get("x").unwrap().name, "first");
        assert!(planner.dependency_index().reverse().is_empty());
    }

    #[test]
    fn test_update_relinks_dependencies() {
        let mut planner = planner_with(&[("a", &[]), ("b", &[]), ("t", &["a"])]);
        assert!(planner.update("t", &TaskPatch::default().dependencies(["b"]).duration(7)));

        let t = planner.get("t").unwrap();
        assert_eq!(t.dependencies, ["b"]);
        assert_eq!(t.estimated_duration, 7);
        assert!(t.updated_at >= t.created_at);
        assert!(planner.dependency_index().dependents("a").is_empty());
        assert_eq!(planner.dependency_index().dependents("b"), ["t"]);
        assert!(planner.dependency_index().is_symmetric());
    }

    #[test]
    fn test_update_unknown_id() {
        let mut planner = planner_with(&[("a", &[])]);
        assert!(!planner.update("missing", &TaskPatch::default().name("x")));
        assert!(!planner.update_value("missing", &json!({"name": "x"})));
        assert_eq!(planner.len(), 1);
    }

    #[test]
    fn test_update_value_normalises_fields() {
        let mut planner = planner_with(&[("a", &[])]);
        assert!(planner.update_value(
            "a",
            &json!({"priority": "HIGH", "estimatedDuration": "12 days", "owner": "kim"})
        ));
        let a = planner.get("a").unwrap();
        assert_eq!(a.priority, Priority::High);
        assert_eq!(a.estimated_duration, 12);
        assert_eq!(a.extra["owner"], "kim");
    }

    #[test]
    fn test_remove_does_not_cascade() {
        let mut planner = planner_with(&[("a", &[]), ("b", &["a"]), ("c", &["b"])]);
        assert!(planner.remove("b"));
        assert!(!planner.remove("b"));

        assert!(planner.contains("c"));
        assert_eq!(planner.get("c").unwrap().dependencies, ["b"]);
        assert!(planner.dependency_index().dependents("a").is_empty());
        assert_eq!(planner.dependency_index().dependents("b"), ["c"]);
        assert!(planner.dependency_index().is_symmetric());
    }

    #[test]
    fn test_removed_prerequisite_starts_dependent_at_zero() {
        let mut planner = TaskPlanner::default();
        planner
            .add(NewTask::new("a").with_id("a").with_duration(5))
            .unwrap();
        planner
            .add(NewTask::new("b").with_id("b").with_duration(3).depends_on(["a"]))
            .unwrap();
        assert_eq!(planner.critical_path().unwrap().timings["b"].earliest_start, 5);

        assert!(planner.remove("a"));
        let report = planner.critical_path().unwrap();
        assert_eq!(report.timings["b"].earliest_start, 0);
        assert_eq!(report.project_duration, 3);
        assert_eq!(report.critical_path, ["b"]);
        assert_eq!(planner.reverse_index()["a"], ["b"]);
    }

    #[test]
    fn test_import_generates_stable_ids() {
        let payload = json!({
            "implementationTasks": [
                {"name": "first"},
                {"id": "implementation-1", "name": "explicit"},
                {"name": "second", "dependencies": ["implementation-1"]},
            ],
            "milestoneTasks": [{"name": "launch", "plannedDate": "Q3"}],
        });

        let mut planner = TaskPlanner::default();
        let summary = planner.import_value(&payload);
        assert_eq!(summary.imported, 4);
        assert_eq!(
            summary.generated_ids,
            ["implementation-2", "implementation-3", "milestone-1"]
        );
        assert_eq!(summary.by_collection["implementationTasks"], 3);
        assert_eq!(summary.by_collection["technicalTasks"], 0);
        assert_eq!(planner.get("milestone-1").unwrap().kind(), TaskKind::Milestone);

        let first = planner.forward_index();
        planner.import_value(&payload);
        assert_eq!(planner.forward_index(), first);
        assert_eq!(planner.ids().count(), 4);
    }

    #[test]
    fn test_import_replaces_registry() {
        let mut planner = planner_with(&[("old", &[])]);
        planner.import_value(&json!({"researchTasks": [{"id": "r"}]}));
        assert!(!planner.contains("old"));
        assert_eq!(planner.get("r").unwrap().kind(), TaskKind::Research);
    }

    #[test]
    fn test_import_duplicates_per_policy() {
        let payload = json!({
            "technicalTasks": [{"id": "x", "name": "one"}, {"id": "x", "name": "two"}]
        });

        let mut overwrite = TaskPlanner::default();
        let summary = overwrite.import_value(&payload);
        assert_eq!(summary.duplicate_ids, ["x"]);
        assert_eq!(overwrite.get("x").unwrap().name, "two");

        let mut reject = TaskPlanner::new(PlannerConfig {
            duplicate_policy: DuplicatePolicy::Reject,
            ..PlannerConfig::default()
        });
        let summary = reject.import_value(&payload);
        assert_eq!(summary.duplicate_ids, ["x"]);
        assert_eq!(reject.get("x").unwrap().name, "one");
        assert_eq!(summary.imported, 1);
    }

    #[test]
    fn test_import_json_error_keeps_registry() {
        let mut planner = planner_with(&[("a", &[])]);
        assert!(planner.import_json("{broken").is_err());
        assert!(planner.contains("a"));

        let summary = planner.import_json("[]").unwrap();
        assert_eq!(summary.imported, 0);
        assert!(planner.is_empty());
    }

    #[test]
    fn test_planner_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TaskPlanner>();
    }

    #[test]
    fn test_clear() {
        let mut planner = planner_with(&[("a", &[]), ("b", &["a"])]);
        planner.clear();
        assert!(planner.is_empty());
        assert!(planner.reverse_index().is_empty());
    }
}
