//! Task dependency graph and critical-path scheduling for taskplan.
//!
//! This crate owns a registry of tasks, keeps forward and reverse dependency
//! indices in lockstep with it, and derives execution order, cycle reports,
//! critical-path timings and risk scores from that state.
//!
//! # Key Types
//!
//! - [`TaskPlanner`]: the engine instance; owns the registry and both indices
//! - [`Task`], [`NewTask`], [`TaskPatch`]: stored records and the inputs that create or change them
//! - [`CriticalPathReport`]: forward/backward pass results, float and critical path
//! - [`RiskAssessment`]: additive risk score with its contributing factors
//! - [`ExportBundle`]: snapshot of the registry with every derived report
//!
//! # Example
//!
//! ```
//! use taskplan_graph::{NewTask, TaskPlanner};
//!
//! let mut planner = TaskPlanner::default();
//! planner.add(NewTask::new("design").with_id("a").with_duration(5))?;
//! planner.add(NewTask::new("docs").with_id("b").with_duration(3).depends_on(["a"]))?;
//! planner.add(NewTask::new("build").with_id("c").with_duration(4).depends_on(["a"]))?;
//!
//! let report = planner.critical_path()?;
//! assert_eq!(report.project_duration, 9);
//! assert_eq!(report.critical_path, vec!["a", "c"]);
//! # Ok::<(), taskplan_graph::Error>(())
//! ```
//!
//! Mutations take `&mut self` and queries take `&self`, so a shared planner
//! behind a `RwLock` gets the single-writer, multiple-reader discipline the
//! scheduling passes rely on.

mod config;
mod critical_path;
mod cycles;
mod error;
mod export;
mod graph;
mod import;
mod index;
mod normalize;
mod planner;
mod queries;
mod risk;
mod stats;
mod task;
mod traversal;
mod validation;

pub use config::{DuplicatePolicy, PlannerConfig, RiskConfig};
pub use critical_path::{CriticalPathReport, CriticalTask, TaskTiming};
pub use error::{Error, Result};
pub use export::ExportBundle;
pub use import::{ImportPayload, ImportSummary};
pub use index::DependencyIndex;
pub use normalize::{DEFAULT_NAME, DEFAULT_SOURCE, MAX_DURATION, dedup_ids, parse_duration};
pub use planner::TaskPlanner;
pub use queries::TaskReport;
pub use risk::{RiskAssessment, RiskFactor};
pub use stats::TaskStatistics;
pub use task::{Difficulty, KindAttributes, NewTask, Priority, Task, TaskKind, TaskPatch};
pub use traversal::{ExecutionLevels, TopologicalOrder};
pub use validation::{DanglingEdge, ValidationResult};

/// Trait for records that name their prerequisites.
///
/// The dependency index is built from anything implementing this trait, so
/// tests and benches can drive it without full [`Task`] records.
pub trait TaskNodeData {
    /// Returns the ids of the tasks this record depends on.
    fn dependency_names(&self) -> impl Iterator<Item = &str>;
}
