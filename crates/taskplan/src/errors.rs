//! CLI error types with miette diagnostics.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors surfaced by the `taskplan` binary.
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Reading an input or writing an output file failed.
    #[error("Failed to {operation} '{}'", path.display())]
    #[diagnostic(
        code(taskplan::cli::file_error),
        help("Check file permissions and ensure the path exists")
    )]
    FileError {
        /// What was being attempted.
        operation: String,
        /// The file involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Reading the task payload from standard input failed.
    #[error("Failed to read task payload from stdin")]
    #[diagnostic(code(taskplan::cli::stdin))]
    Stdin {
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An error raised by the planner itself.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Planner(#[from] taskplan_graph::Error),

    /// The requested task is not registered.
    #[error("Task '{id}' not found")]
    #[diagnostic(
        code(taskplan::cli::task_not_found),
        help("Run 'taskplan order <FILE>' to list the registered task ids")
    )]
    TaskNotFound {
        /// The id that was asked for.
        id: String,
    },

    /// Validation found errors in the task graph.
    #[error("Task graph is invalid: {count} error(s)")]
    #[diagnostic(code(taskplan::cli::validation_failed))]
    ValidationFailed {
        /// Number of validation errors.
        count: usize,
    },

    /// Serializing a report failed.
    #[error("Failed to serialize output")]
    #[diagnostic(code(taskplan::cli::serialize))]
    Serialize {
        /// Underlying serializer error.
        #[source]
        source: serde_json::Error,
    },

    /// Writing to standard output failed.
    #[error("Failed to write output")]
    #[diagnostic(code(taskplan::cli::output))]
    Output {
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl CliError {
    /// Create a file error.
    pub fn file_error(
        operation: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FileError {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Create a task-not-found error.
    pub fn task_not_found(id: impl Into<String>) -> Self {
        Self::TaskNotFound { id: id.into() }
    }
}

impl From<std::io::Error> for CliError {
    fn from(source: std::io::Error) -> Self {
        Self::Output { source }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(source: serde_json::Error) -> Self {
        Self::Serialize { source }
    }
}
