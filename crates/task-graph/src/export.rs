//! Snapshot of the planner with every derived report.

use crate::{CriticalPathReport, RiskAssessment, Task, TaskPlanner, TaskStatistics};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::info;

/// Full export of the registry, its indices and the reports derived from
/// them.
///
/// Order-dependent reports are `None` when the graph has cycles; `cycles`
/// then says why.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    /// Every task by id, in registration order.
    pub tasks: IndexMap<String, Task>,
    /// Forward index: task to prerequisites.
    pub dependencies: IndexMap<String, Vec<String>>,
    /// Reverse index: prerequisite to dependents.
    pub dependents: IndexMap<String, Vec<String>>,
    /// Registry statistics.
    pub statistics: TaskStatistics,
    /// Dependency cycles, empty for an acyclic graph.
    pub cycles: Vec<Vec<String>>,
    /// Dependency order.
    pub topological_order: Option<Vec<String>>,
    /// Critical path report.
    pub critical_path: Option<CriticalPathReport>,
    /// High-risk tasks.
    pub risk_tasks: Vec<RiskAssessment>,
    /// When the snapshot was taken.
    pub export_time: DateTime<Utc>,
}

impl TaskPlanner {
    /// Take a snapshot of the whole planner.
    #[must_use]
    pub fn export(&self) -> ExportBundle {
        let cycles = self.detect_cycles();
        let (topological_order, critical_path) = if cycles.is_empty() {
            (self.topological_order().ok(), self.critical_path().ok())
        } else {
            (None, None)
        };

        let bundle = ExportBundle {
            tasks: self.tasks.clone(),
            dependencies: self.forward_index(),
            dependents: self.reverse_index(),
            statistics: self.statistics(),
            cycles,
            topological_order,
            critical_path,
            risk_tasks: self.risk_report(),
            export_time: Utc::now(),
        };
        info!(
            tasks = bundle.tasks.len(),
            cycles = bundle.cycles.len(),
            "exported planner snapshot"
        );
        bundle
    }
}

#[cfg(test)]
mod tests {
    use crate::{NewTask, TaskPlanner};

    #[test]
    fn test_export_acyclic() {
        let mut planner = TaskPlanner::default();
        planner.add(NewTask::new("a").with_id("a").with_duration(2)).unwrap();
        planner
            .add(NewTask::new("b").with_id("b").with_duration(3).depends_on(["a"]))
            .unwrap();

        let bundle = planner.export();
        assert_eq!(bundle.tasks.len(), 2);
        assert_eq!(bundle.dependencies["b"], ["a"]);
        assert_eq!(bundle.dependents["a"], ["b"]);
        assert!(bundle.cycles.is_empty());
        assert_eq!(
            bundle.topological_order.as_deref(),
            Some(&["a".to_string(), "b".to_string()][..])
        );
        assert_eq!(bundle.critical_path.unwrap().project_duration, 5);

        let json = serde_json::to_value(planner.export()).unwrap();
        assert!(json["exportTime"].is_string());
        assert_eq!(json["tasks"]["b"]["dependencies"][0], "a");
        assert_eq!(json["statistics"]["totalTasks"], 2);
    }

    #[test]
    fn test_export_with_cycles() {
        let mut planner = TaskPlanner::default();
        planner
            .add(NewTask::new("a").with_id("a").depends_on(["b"]))
            .unwrap();
        planner
            .add(NewTask::new("b").with_id("b").depends_on(["a"]))
            .unwrap();

        let bundle = planner.export();
        assert_eq!(bundle.cycles.len(), 1);
        assert!(bundle.topological_order.is_none());
        assert!(bundle.critical_path.is_none());

        let json = serde_json::to_value(&bundle).unwrap();
        assert!(json["criticalPath"].is_null());
    }
}
