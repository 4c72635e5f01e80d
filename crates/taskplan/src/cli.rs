use crate::commands::{Command, DepsQuery};
use crate::tracing::{LogLevel, TracingFormat};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "taskplan")]
#[command(about = "Dependency analysis and critical-path scheduling for extracted task lists")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        short = 'l',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    #[arg(
        long,
        global = true,
        help = "Log output format",
        default_value = "compact",
        value_enum
    )]
    pub log_format: TracingFormat,

    #[arg(long, global = true, help = "Output logs in JSON format")]
    pub json: bool,

    #[arg(
        long,
        global = true,
        env = "TASKPLAN_CONFIG",
        help = "Planner configuration file (TOML)"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = "Report format",
        default_value = "text",
        value_enum
    )]
    pub format: OutputFormat,
}

/// How reports are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Pretty-printed JSON
    Json,
}

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    #[arg(help = "Import payload (JSON); '-' reads stdin")]
    pub file: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Normalise a payload and print the import summary")]
    ImportCheck {
        #[command(flatten)]
        input: InputArgs,
    },
    #[command(about = "Registry statistics")]
    Stats {
        #[command(flatten)]
        input: InputArgs,
    },
    #[command(about = "Topological order, prerequisites first")]
    Order {
        #[command(flatten)]
        input: InputArgs,
    },
    #[command(about = "Execution levels of mutually independent tasks")]
    Levels {
        #[command(flatten)]
        input: InputArgs,
    },
    #[command(about = "Report dependency cycles")]
    Cycles {
        #[command(flatten)]
        input: InputArgs,
    },
    #[command(about = "Critical-path schedule")]
    CriticalPath {
        #[command(flatten)]
        input: InputArgs,
    },
    #[command(about = "List high-risk tasks")]
    Risk {
        #[command(flatten)]
        input: InputArgs,
    },
    #[command(about = "Dependency queries for one task")]
    Deps {
        #[command(flatten)]
        input: InputArgs,
        #[arg(help = "Task id")]
        id: String,
        #[arg(
            long,
            help = "Prerequisites at any depth",
            conflicts_with_all = ["reverse", "dependents", "chains"]
        )]
        transitive: bool,
        #[arg(
            long,
            help = "Tasks listing this one as a prerequisite",
            conflicts_with_all = ["dependents", "chains"]
        )]
        reverse: bool,
        #[arg(
            long,
            help = "Dependents at any depth",
            conflicts_with = "chains"
        )]
        dependents: bool,
        #[arg(long, help = "Prerequisite paths down to root tasks")]
        chains: bool,
    },
    #[command(about = "Everything known about one task")]
    Show {
        #[command(flatten)]
        input: InputArgs,
        #[arg(help = "Task id")]
        id: String,
    },
    #[command(about = "Validate the task graph")]
    Validate {
        #[command(flatten)]
        input: InputArgs,
    },
    #[command(about = "Export the full planner snapshot as JSON")]
    Export {
        #[command(flatten)]
        input: InputArgs,
        #[arg(short = 'o', long, help = "Write to a file instead of stdout")]
        output: Option<PathBuf>,
    },
    #[command(about = "Render the dependency graph as Graphviz DOT")]
    Dot {
        #[command(flatten)]
        input: InputArgs,
    },
}

impl Cli {
    /// Log format after applying the `--json` shorthand.
    pub const fn tracing_format(&self) -> TracingFormat {
        if self.json {
            TracingFormat::Json
        } else {
            self.log_format
        }
    }
}

impl Commands {
    /// The payload the command reads.
    pub const fn input(&self) -> &InputArgs {
        match self {
            Self::ImportCheck { input }
            | Self::Stats { input }
            | Self::Order { input }
            | Self::Levels { input }
            | Self::Cycles { input }
            | Self::CriticalPath { input }
            | Self::Risk { input }
            | Self::Deps { input, .. }
            | Self::Show { input, .. }
            | Self::Validate { input }
            | Self::Export { input, .. }
            | Self::Dot { input } => input,
        }
    }
}

impl From<Commands> for Command {
    fn from(cmd: Commands) -> Self {
        match cmd {
            Commands::ImportCheck { .. } => Self::ImportCheck,
            Commands::Stats { .. } => Self::Stats,
            Commands::Order { .. } => Self::Order,
            Commands::Levels { .. } => Self::Levels,
            Commands::Cycles { .. } => Self::Cycles,
            Commands::CriticalPath { .. } => Self::CriticalPath,
            Commands::Risk { .. } => Self::Risk,
            Commands::Deps {
                id,
                transitive,
                reverse,
                dependents,
                chains,
                ..
            } => {
                let query = if transitive {
                    DepsQuery::Transitive
                } else if reverse {
                    DepsQuery::Reverse
                } else if dependents {
                    DepsQuery::Dependents
                } else if chains {
                    DepsQuery::Chains
                } else {
                    DepsQuery::Direct
                };
                Self::Deps { id, query }
            }
            Commands::Show { id, .. } => Self::Show { id },
            Commands::Validate { .. } => Self::Validate,
            Commands::Export { output, .. } => Self::Export { output },
            Commands::Dot { .. } => Self::Dot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::try_parse_from(["taskplan", "stats", "tasks.json"]).unwrap();

        assert!(matches!(cli.level, LogLevel::Warn));
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(!cli.json);
        assert_eq!(cli.tracing_format(), TracingFormat::Compact);
        assert!(matches!(cli.command, Commands::Stats { .. }));
        assert_eq!(cli.command.input().file, PathBuf::from("tasks.json"));
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "taskplan", "order", "-", "--format", "json", "-l", "debug", "--json",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(matches!(cli.level, LogLevel::Debug));
        assert!(cli.json);
        assert_eq!(cli.tracing_format(), TracingFormat::Json);
        assert_eq!(cli.command.input().file, PathBuf::from("-"));
    }

    #[test]
    fn test_deps_query_selection() {
        let cli = Cli::try_parse_from(["taskplan", "deps", "t.json", "b"]).unwrap();
        assert!(matches!(
            Command::from(cli.command),
            Command::Deps { ref id, query: DepsQuery::Direct } if id == "b"
        ));

        let cli = Cli::try_parse_from(["taskplan", "deps", "t.json", "b", "--chains"]).unwrap();
        assert!(matches!(
            Command::from(cli.command),
            Command::Deps { query: DepsQuery::Chains, .. }
        ));

        let cli =
            Cli::try_parse_from(["taskplan", "deps", "t.json", "b", "--dependents"]).unwrap();
        assert!(matches!(
            Command::from(cli.command),
            Command::Deps { query: DepsQuery::Dependents, .. }
        ));
    }

    #[test]
    fn test_deps_flags_conflict() {
        let result =
            Cli::try_parse_from(["taskplan", "deps", "t.json", "b", "--transitive", "--reverse"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_export_output() {
        let cli =
            Cli::try_parse_from(["taskplan", "export", "t.json", "-o", "out.json"]).unwrap();
        assert!(matches!(
            Command::from(cli.command),
            Command::Export { output: Some(ref p) } if p == &PathBuf::from("out.json")
        ));
    }

    #[test]
    fn test_missing_file_is_rejected() {
        assert!(Cli::try_parse_from(["taskplan", "stats"]).is_err());
    }

    #[test]
    fn test_invalid_format() {
        assert!(Cli::try_parse_from(["taskplan", "stats", "t.json", "--format", "yaml"]).is_err());
    }
}
