//! Command execution: load the payload into a planner, run one query, write
//! the report.

mod report;

use crate::cli::OutputFormat;
use crate::errors::{CliError, Result};
use serde::Serialize;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use taskplan_graph::{ImportSummary, PlannerConfig, TaskPlanner};
use tracing::{debug, info};

/// Which dependency relation `deps` prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepsQuery {
    Direct,
    Transitive,
    Reverse,
    Dependents,
    Chains,
}

#[derive(Debug, Clone)]
pub enum Command {
    ImportCheck,
    Stats,
    Order,
    Levels,
    Cycles,
    CriticalPath,
    Risk,
    Deps { id: String, query: DepsQuery },
    Show { id: String },
    Validate,
    Export { output: Option<PathBuf> },
    Dot,
}

impl Command {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ImportCheck => "import-check",
            Self::Stats => "stats",
            Self::Order => "order",
            Self::Levels => "levels",
            Self::Cycles => "cycles",
            Self::CriticalPath => "critical-path",
            Self::Risk => "risk",
            Self::Deps { .. } => "deps",
            Self::Show { .. } => "show",
            Self::Validate => "validate",
            Self::Export { .. } => "export",
            Self::Dot => "dot",
        }
    }
}

/// Load the planner configuration, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<PlannerConfig> {
    match path {
        Some(path) => {
            let config = PlannerConfig::load(path)?;
            debug!(path = %path.display(), "loaded planner configuration");
            Ok(config)
        }
        None => Ok(PlannerConfig::default()),
    }
}

/// Read the payload text from a file, or from stdin for `-`.
pub fn read_payload(file: &Path) -> Result<String> {
    if file == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|source| CliError::Stdin { source })?;
        Ok(text)
    } else {
        std::fs::read_to_string(file).map_err(|e| CliError::file_error("read", file, e))
    }
}

/// Build a planner from payload text.
pub fn load_planner(text: &str, config: PlannerConfig) -> Result<(TaskPlanner, ImportSummary)> {
    let mut planner = TaskPlanner::new(config);
    let summary = planner.import_json(text)?;
    info!(
        imported = summary.imported,
        registered = planner.len(),
        "payload loaded"
    );
    Ok((planner, summary))
}

/// Run `command` against a loaded planner, writing the report to `out`.
pub fn execute(
    command: Command,
    planner: &TaskPlanner,
    summary: &ImportSummary,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let json = format == OutputFormat::Json;
    match command {
        Command::ImportCheck => {
            if json {
                write_json(out, summary)
            } else {
                report::import_summary(out, summary, planner.len())
            }
        }
        Command::Stats => {
            let stats = planner.statistics();
            if json {
                write_json(out, &stats)
            } else {
                report::statistics(out, &stats)
            }
        }
        Command::Order => {
            let order = planner.topological_order()?;
            if json {
                write_json(out, &order)
            } else {
                report::id_lines(out, &order)
            }
        }
        Command::Levels => {
            let levels = planner.execution_levels()?;
            if json {
                write_json(out, &levels)
            } else {
                report::levels(out, &levels)
            }
        }
        Command::Cycles => {
            let cycles = planner.detect_cycles();
            if json {
                write_json(out, &cycles)
            } else {
                report::cycles(out, &cycles)
            }
        }
        Command::CriticalPath => {
            let schedule = planner.critical_path()?;
            if json {
                write_json(out, &schedule)
            } else {
                report::critical_path(out, &schedule)
            }
        }
        Command::Risk => {
            let risks = planner.risk_report();
            if json {
                write_json(out, &risks)
            } else {
                report::risks(out, &risks)
            }
        }
        Command::Deps { id, query } => deps(planner, &id, query, json, out),
        Command::Show { id } => {
            let task_report = planner
                .task_report(&id)
                .ok_or_else(|| CliError::task_not_found(&id))?;
            if json {
                write_json(out, &task_report)
            } else {
                report::task(out, &task_report)
            }
        }
        Command::Validate => {
            let result = planner.validate();
            if json {
                write_json(out, &report::validation_json(&result))?;
            } else {
                report::validation(out, &result)?;
            }
            if result.is_valid {
                Ok(())
            } else {
                Err(CliError::ValidationFailed {
                    count: result.errors.len(),
                })
            }
        }
        Command::Export { output } => {
            let bundle = planner.export();
            match output {
                Some(path) => {
                    let text = serde_json::to_string_pretty(&bundle)?;
                    std::fs::write(&path, text + "\n")
                        .map_err(|e| CliError::file_error("write", &path, e))?;
                    info!(path = %path.display(), "export written");
                    Ok(())
                }
                None => write_json(out, &bundle),
            }
        }
        Command::Dot => {
            out.write_all(planner.to_dot().as_bytes())?;
            Ok(())
        }
    }
}

fn deps(
    planner: &TaskPlanner,
    id: &str,
    query: DepsQuery,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    if query == DepsQuery::Chains {
        let chains = planner.dependency_chains(id);
        return if json {
            write_json(out, &chains)
        } else {
            report::chains(out, &chains)
        };
    }

    let ids = match query {
        DepsQuery::Direct => planner.direct_dependencies(id),
        DepsQuery::Transitive => planner.all_dependencies(id),
        DepsQuery::Reverse => planner.reverse_dependencies(id),
        DepsQuery::Dependents | DepsQuery::Chains => planner.all_dependents(id),
    };
    if json {
        write_json(out, &ids)
    } else {
        report::id_lines(out, &ids)
    }
}

fn write_json<T: Serialize + ?Sized>(out: &mut impl Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
