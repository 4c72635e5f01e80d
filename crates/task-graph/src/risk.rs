//! Additive schedule-risk scoring.

use crate::{Difficulty, Priority, RiskConfig, Task, TaskPlanner};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// A condition that adds to a task's risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskFactor {
    /// Priority is high.
    HighPriority,
    /// Technical difficulty is high.
    HighDifficulty,
    /// Duration exceeds the long-duration threshold.
    LongDuration,
    /// More prerequisites than the threshold.
    ManyPrerequisites,
    /// More dependents than the threshold.
    ManyDependents,
    /// More key technologies than the threshold.
    ManyTechnologies,
}

impl RiskFactor {
    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::HighPriority => "high priority",
            Self::HighDifficulty => "high technical difficulty",
            Self::LongDuration => "long duration",
            Self::ManyPrerequisites => "many prerequisites",
            Self::ManyDependents => "many dependents",
            Self::ManyTechnologies => "many key technologies",
        }
    }

    /// Score this factor adds under `config`.
    #[must_use]
    pub const fn weight(&self, config: &RiskConfig) -> u32 {
        match self {
            Self::HighPriority => config.high_priority_weight,
            Self::HighDifficulty => config.high_difficulty_weight,
            Self::LongDuration => config.long_duration_weight,
            Self::ManyPrerequisites => config.many_prerequisites_weight,
            Self::ManyDependents => config.many_dependents_weight,
            Self::ManyTechnologies => config.many_technologies_weight,
        }
    }
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Risk score of one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    /// Task id.
    pub task_id: String,
    /// Task name.
    pub name: String,
    /// Sum of the weights of `factors`.
    pub score: u32,
    /// Applying factors, in a fixed order.
    pub factors: Vec<RiskFactor>,
    /// Whether the score reaches the configured threshold.
    pub high_risk: bool,
}

impl TaskPlanner {
    /// Score one task, whatever its score. `None` for an unknown id.
    #[must_use]
    pub fn assess(&self, id: &str) -> Option<RiskAssessment> {
        self.get(id).map(|task| self.score(task))
    }

    /// High-risk tasks, highest score first. Equal scores keep registration
    /// order.
    #[must_use]
    pub fn risk_report(&self) -> Vec<RiskAssessment> {
        let mut report: Vec<RiskAssessment> = self
            .tasks()
            .map(|task| self.score(task))
            .filter(|assessment| assessment.high_risk)
            .collect();
        report.sort_by(|a, b| b.score.cmp(&a.score));
        debug!(high_risk = report.len(), "computed risk report");
        report
    }

    fn score(&self, task: &Task) -> RiskAssessment {
        let config = &self.config.risk;
        let checks = [
            (RiskFactor::HighPriority, task.priority == Priority::High),
            (
                RiskFactor::HighDifficulty,
                task.technical_difficulty() == Some(Difficulty::High),
            ),
            (
                RiskFactor::LongDuration,
                task.estimated_duration > config.long_duration_days,
            ),
            (
                RiskFactor::ManyPrerequisites,
                self.index.prerequisites(&task.id).len() > config.many_prerequisites_count,
            ),
            (
                RiskFactor::ManyDependents,
                self.index.dependents(&task.id).len() > config.many_dependents_count,
            ),
            (
                RiskFactor::ManyTechnologies,
                task.key_technologies.len() > config.many_technologies_count,
            ),
        ];

        let factors: Vec<RiskFactor> = checks
            .into_iter()
            .filter(|(_, applies)| *applies)
            .map(|(factor, _)| factor)
            .collect();
        let score = factors
            .iter()
            .map(|factor| factor.weight(config))
            .fold(0u32, u32::saturating_add);

        RiskAssessment {
            task_id: task.id.clone(),
            name: task.name.clone(),
            score,
            factors,
            high_risk: score >= config.threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NewTask, PlannerConfig};

    fn risky_planner() -> TaskPlanner {
        let mut planner = TaskPlanner::default();
        for id in ["p1", "p2", "p3"] {
            planner.add(NewTask::new(id).with_id(id)).unwrap();
        }
        planner
            .add(
                NewTask::new("Migrate storage")
                    .with_id("risky")
                    .with_priority(Priority::High)
                    .with_difficulty(Difficulty::High)
                    .with_duration(25)
                    .depends_on(["p1", "p2", "p3"]),
            )
            .unwrap();
        planner
    }

    #[test]
    fn test_combined_factors() {
        let assessment = risky_planner().assess("risky").unwrap();
        assert_eq!(assessment.score, 105);
        assert_eq!(
            assessment.factors,
            [
                RiskFactor::HighPriority,
                RiskFactor::HighDifficulty,
                RiskFactor::LongDuration,
                RiskFactor::ManyPrerequisites,
            ]
        );
        assert!(assessment.high_risk);
        let labels: Vec<_> = assessment.factors.iter().map(RiskFactor::label).collect();
        assert_eq!(
            labels,
            [
                "high priority",
                "high technical difficulty",
                "long duration",
                "many prerequisites"
            ]
        );
    }

    #[test]
    fn test_difficulty_counts_for_every_kind() {
        let mut planner = TaskPlanner::default();
        planner.import_value(&serde_json::json!({
            "implementationTasks": [
                {"id": "p1"},
                {"id": "p2"},
                {"id": "p3"},
                {
                    "id": "x",
                    "priority": "high",
                    "technicalDifficulty": "high",
                    "estimatedDuration": 25,
                    "dependencies": ["p1", "p2", "p3"]
                }
            ],
            "technicalTasks": [
                {"id": "y", "type": "backend", "technicalDifficulty": "high", "priority": "high"}
            ]
        }));

        let x = planner.assess("x").unwrap();
        assert_eq!(planner.get("x").unwrap().kind(), crate::TaskKind::Implementation);
        assert_eq!(x.score, 105);
        assert!(x.factors.contains(&RiskFactor::HighDifficulty));

        let y = planner.assess("y").unwrap();
        assert_eq!(
            y.factors,
            [RiskFactor::HighPriority, RiskFactor::HighDifficulty]
        );
        assert_eq!(y.score, 70);
    }

    #[test]
    fn test_thresholds_are_exclusive() {
        let mut planner = TaskPlanner::default();
        planner
            .add(
                NewTask::new("edge")
                    .with_id("edge")
                    .with_duration(20)
                    .depends_on(["x", "y"])
                    .with_key_technologies(["a", "b", "c"]),
            )
            .unwrap();
        let assessment = planner.assess("edge").unwrap();
        assert_eq!(assessment.score, 0);
        assert!(assessment.factors.is_empty());
    }

    #[test]
    fn test_dependents_and_technologies() {
        let mut planner = TaskPlanner::default();
        planner
            .add(
                NewTask::new("core")
                    .with_id("core")
                    .with_key_technologies(["rust", "cue", "nix", "oci"]),
            )
            .unwrap();
        for id in ["u1", "u2", "u3"] {
            planner
                .add(NewTask::new(id).with_id(id).depends_on(["core"]))
                .unwrap();
        }
        let assessment = planner.assess("core").unwrap();
        assert_eq!(
            assessment.factors,
            [RiskFactor::ManyDependents, RiskFactor::ManyTechnologies]
        );
        assert_eq!(assessment.score, 25);
        assert!(!assessment.high_risk);
    }

    #[test]
    fn test_report_sorted_by_score_then_registration() {
        let mut planner = TaskPlanner::default();
        planner
            .add(
                NewTask::new("a")
                    .with_id("a")
                    .with_priority(Priority::High)
                    .with_duration(30),
            )
            .unwrap();
        planner
            .add(
                NewTask::new("b")
                    .with_id("b")
                    .with_difficulty(Difficulty::High)
                    .with_priority(Priority::High),
            )
            .unwrap();
        planner
            .add(
                NewTask::new("c")
                    .with_id("c")
                    .with_priority(Priority::High)
                    .with_duration(21),
            )
            .unwrap();
        planner.add(NewTask::new("d").with_id("d")).unwrap();

        let report = planner.risk_report();
        let ids: Vec<_> = report.iter().map(|r| r.task_id.as_str()).collect();
        assert_eq!(ids, ["b", "a", "c"]);
        assert_eq!(report[0].score, 70);
        assert_eq!(report[1].score, 50);
    }

    #[test]
    fn test_configured_threshold() {
        let mut planner = TaskPlanner::new(PlannerConfig {
            risk: RiskConfig {
                threshold: 30,
                ..RiskConfig::default()
            },
            ..PlannerConfig::default()
        });
        planner
            .add(NewTask::new("a").with_id("a").with_priority(Priority::High))
            .unwrap();
        assert_eq!(planner.risk_report().len(), 1);
        assert!(planner.assess("missing").is_none());
    }

    #[test]
    fn test_factor_serialization() {
        let json = serde_json::to_value(RiskFactor::ManyPrerequisites).unwrap();
        assert_eq!(json, "many-prerequisites");
    }
}
