//! Error types for task graph operations.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for task graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during task graph operations.
///
/// Unknown task ids are not errors: lookups and mutations report them
/// through `bool` / `Option` results instead.
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum Error {
    /// The dependency graph is not acyclic, so no valid order exists.
    #[error("Cycle detected in task graph: {}", format_cycles(cycles))]
    #[diagnostic(
        code(taskplan_graph::cycle_detected),
        help("Remove one dependency from each reported cycle")
    )]
    CycleDetected {
        /// Every cycle found, each as the sequence of task ids on it.
        cycles: Vec<Vec<String>>,
    },

    /// A task with the same id is already registered and the configured
    /// policy rejects duplicates.
    #[error("Task '{id}' already exists")]
    #[diagnostic(code(taskplan_graph::duplicate_task))]
    DuplicateTask {
        /// The colliding id.
        id: String,
    },

    /// The import payload is not valid JSON.
    #[error("Invalid task payload: {message}")]
    #[diagnostic(code(taskplan_graph::payload))]
    Payload {
        /// Parser message.
        message: String,
    },

    /// Planner configuration could not be read or parsed.
    #[error("Configuration error: {message}")]
    #[diagnostic(code(taskplan_graph::config))]
    Configuration {
        /// Description of the problem.
        message: String,
        /// File the configuration was read from, if any.
        path: Option<PathBuf>,
    },
}

impl Error {
    /// Create a cycle error from the detector output.
    #[must_use]
    pub fn cycle_detected(cycles: Vec<Vec<String>>) -> Self {
        Self::CycleDetected { cycles }
    }

    /// Create a payload error.
    #[must_use]
    pub fn payload(message: impl Into<String>) -> Self {
        Self::Payload {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Configuration {
            message: message.into(),
            path,
        }
    }

    /// Whether this error reports a cyclic graph.
    #[must_use]
    pub fn is_cycle(&self) -> bool {
        matches!(self, Self::CycleDetected { .. })
    }
}

fn format_cycles(cycles: &[Vec<String>]) -> String {
    if cycles.is_empty() {
        return "graph is not acyclic".to_string();
    }
    cycles
        .iter()
        .map(|cycle| {
            let mut ids = cycle.clone();
            if let Some(first) = cycle.first() {
                ids.push(first.clone());
            }
            ids.join(" -> ")
        })
        .collect::<Vec<_>>()
        .join("; ")
}
