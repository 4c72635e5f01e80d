mod cli;
mod commands;
mod errors;
mod tracing;

use crate::commands::Command;
use crate::tracing::TracingConfig;
use clap::Parser;
use std::io::Write;

fn main() -> miette::Result<()> {
    let cli = cli::Cli::parse();

    crate::tracing::init_tracing(TracingConfig {
        format: cli.tracing_format(),
        level: cli.level.into(),
        ..TracingConfig::default()
    })?;

    run(cli)?;
    Ok(())
}

fn run(cli: cli::Cli) -> errors::Result<()> {
    let config = commands::load_config(cli.config.as_deref())?;
    let text = commands::read_payload(&cli.command.input().file)?;
    let (planner, summary) = commands::load_planner(&text, config)?;

    let command = Command::from(cli.command);
    let span = crate::tracing::command_span(command.name());
    let _guard = span.enter();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    commands::execute(command, &planner, &summary, cli.format, &mut out)?;
    out.flush()?;
    Ok(())
}
