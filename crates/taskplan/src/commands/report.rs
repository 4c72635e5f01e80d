//! Plain-text rendering of planner reports.

use crate::errors::Result;
use serde_json::{Value, json};
use std::io::Write;
use taskplan_graph::{
    CriticalPathReport, ImportSummary, RiskAssessment, TaskReport, TaskStatistics,
    ValidationResult,
};

pub fn import_summary(
    out: &mut impl Write,
    summary: &ImportSummary,
    registered: usize,
) -> Result<()> {
    writeln!(out, "Imported {} task(s), {registered} registered", summary.imported)?;
    for (collection, count) in &summary.by_collection {
        writeln!(out, "  {collection}: {count}")?;
    }
    if !summary.generated_ids.is_empty() {
        writeln!(out, "Generated ids: {}", summary.generated_ids.join(", "))?;
    }
    if !summary.duplicate_ids.is_empty() {
        writeln!(out, "Duplicate ids: {}", summary.duplicate_ids.join(", "))?;
    }
    for note in &summary.notes {
        writeln!(out, "note: {note}")?;
    }
    Ok(())
}

pub fn statistics(out: &mut impl Write, stats: &TaskStatistics) -> Result<()> {
    writeln!(out, "Total tasks:              {}", stats.total_tasks)?;
    writeln!(out, "By type:")?;
    for (kind, count) in &stats.tasks_by_type {
        writeln!(out, "  {:<22}  {count}", kind.as_str())?;
    }
    writeln!(out, "By priority:")?;
    for (priority, count) in &stats.tasks_by_priority {
        writeln!(out, "  {:<22}  {count}", priority.as_str())?;
    }
    writeln!(out, "With dependencies:        {}", stats.tasks_with_dependencies)?;
    writeln!(out, "With deliverables:        {}", stats.tasks_with_deliverables)?;
    writeln!(out, "Average duration:         {}", stats.average_duration)?;
    writeln!(out, "Total estimated duration: {}", stats.total_estimated_duration)?;
    Ok(())
}

pub fn id_lines(out: &mut impl Write, ids: &[String]) -> Result<()> {
    for id in ids {
        writeln!(out, "{id}")?;
    }
    Ok(())
}

pub fn levels(out: &mut impl Write, levels: &[Vec<String>]) -> Result<()> {
    for (level, ids) in levels.iter().enumerate() {
        writeln!(out, "Level {level}: {}", ids.join(", "))?;
    }
    Ok(())
}

pub fn chains(out: &mut impl Write, chains: &[Vec<String>]) -> Result<()> {
    for chain in chains {
        writeln!(out, "{}", chain.join(" -> "))?;
    }
    Ok(())
}

fn closed_loop(cycle: &[String]) -> String {
    let mut ids = cycle.to_vec();
    if let Some(first) = cycle.first() {
        ids.push(first.clone());
    }
    ids.join(" -> ")
}

pub fn cycles(out: &mut impl Write, cycles: &[Vec<String>]) -> Result<()> {
    if cycles.is_empty() {
        writeln!(out, "No dependency cycles")?;
        return Ok(());
    }
    writeln!(out, "{} cycle(s) found", cycles.len())?;
    for (i, cycle) in cycles.iter().enumerate() {
        writeln!(out, "  {}: {}", i + 1, closed_loop(cycle))?;
    }
    Ok(())
}

pub fn critical_path(out: &mut impl Write, report: &CriticalPathReport) -> Result<()> {
    writeln!(out, "Project duration: {}", report.project_duration)?;
    writeln!(out, "Critical path: {}", report.critical_path.join(" -> "))?;
    writeln!(out)?;
    writeln!(out, "{:<24} {:>6} {:>6} {:>6} {:>6} {:>6}", "TASK", "ES", "EF", "LS", "LF", "FLOAT")?;
    for (id, timing) in &report.timings {
        let marker = if timing.is_critical() { "*" } else { "" };
        writeln!(
            out,
            "{:<24} {:>6} {:>6} {:>6} {:>6} {:>6}{marker}",
            id,
            timing.earliest_start,
            timing.earliest_finish,
            timing.latest_start,
            timing.latest_finish,
            timing.total_float,
        )?;
    }
    Ok(())
}

pub fn risks(out: &mut impl Write, risks: &[RiskAssessment]) -> Result<()> {
    if risks.is_empty() {
        writeln!(out, "No high-risk tasks")?;
        return Ok(());
    }
    for risk in risks {
        let factors: Vec<&str> = risk.factors.iter().map(|f| f.label()).collect();
        writeln!(
            out,
            "{:>4}  {}  {} ({})",
            risk.score,
            risk.task_id,
            risk.name,
            factors.join(", ")
        )?;
    }
    Ok(())
}

pub fn task(out: &mut impl Write, report: &TaskReport) -> Result<()> {
    let task = &report.task;
    writeln!(out, "{} - {}", task.id, task.name)?;
    writeln!(out, "  kind:       {}", task.kind())?;
    writeln!(out, "  priority:   {}", task.priority)?;
    writeln!(out, "  duration:   {}", task.estimated_duration)?;
    if !task.source.is_empty() {
        writeln!(out, "  source:     {}", task.source)?;
    }
    writeln!(out, "  depends on: {}", report.direct_dependencies.join(", "))?;
    writeln!(out, "  all deps:   {}", report.all_dependencies.join(", "))?;
    writeln!(out, "  needed by:  {}", report.reverse_dependencies.join(", "))?;
    writeln!(out, "  dependents: {}", report.all_dependents.join(", "))?;
    writeln!(out, "  risk:       {}", report.risk.score)?;
    match report.timing {
        Some(timing) => writeln!(
            out,
            "  schedule:   start {}..{}, finish {}..{}, float {}",
            timing.earliest_start,
            timing.latest_start,
            timing.earliest_finish,
            timing.latest_finish,
            timing.total_float
        )?,
        None => writeln!(out, "  schedule:   unavailable (graph has cycles)")?,
    }
    Ok(())
}

pub fn validation(out: &mut impl Write, result: &ValidationResult) -> Result<()> {
    if result.is_valid {
        writeln!(out, "Task graph is valid")?;
    }
    for error in &result.errors {
        writeln!(out, "error: {error}")?;
    }
    for edge in &result.dangling_edges {
        writeln!(
            out,
            "warning: '{}' depends on unknown task '{}'",
            edge.task, edge.missing
        )?;
    }
    Ok(())
}

/// JSON view of a validation result; errors are rendered as messages.
pub fn validation_json(result: &ValidationResult) -> Value {
    json!({
        "isValid": result.is_valid,
        "errors": result.errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "danglingEdges": result.dangling_edges,
    })
}
