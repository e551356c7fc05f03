//! CLI definitions and entry point.

use crate::logging::LogFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// Idea → epic → task tracker with dependency-aware next-task selection
#[derive(Parser, Debug)]
#[command(name = "trellis", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (auto-discover .trellis/trellis.db if not set)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// `SQLite` busy timeout in ms
    #[arg(long, global = true)]
    pub lock_timeout: Option<u64>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log line format on stderr: pretty or json
    #[arg(long, global = true, env = "TRELLIS_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a trellis workspace in the current directory
    Init(InitArgs),

    /// Create an idea, epic or task
    Create {
        #[command(subcommand)]
        command: CreateCommands,
    },

    /// Update fields on any entity
    Update(UpdateArgs),

    /// Delete an entity (ideas and epics cascade to their children)
    Delete(DeleteArgs),

    /// Show one entity with its children, notes and dependencies
    Show(ShowArgs),

    /// List entities
    List(ListArgs),

    /// Show the next task to work on
    Next(NextArgs),

    /// Show a task's dependencies, blockers and dependents
    Deps(DepsArgs),

    /// Append a progress note to an entity
    #[command(alias = "comment")]
    Note(NoteArgs),

    /// Report dependency cycles
    Cycles,
}

#[derive(Args, Debug, Default)]
pub struct InitArgs {
    /// Overwrite an existing database
    #[arg(long)]
    pub force: bool,
}

#[derive(Subcommand, Debug)]
pub enum CreateCommands {
    /// Create a top-level idea
    Idea(CreateIdeaArgs),
    /// Create an epic, optionally under an idea
    Epic(CreateEpicArgs),
    /// Create a task, bug or research item, optionally under an epic
    Task(CreateTaskArgs),
}

#[derive(Args, Debug, Default)]
pub struct CreateIdeaArgs {
    /// Title
    pub title: String,

    /// Description
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Priority (low, medium, high; defaults to config `default-priority`)
    #[arg(short, long)]
    pub priority: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct CreateEpicArgs {
    /// Title
    pub title: String,

    /// Parent idea ID (e.g. IDEA-1)
    #[arg(long)]
    pub idea: Option<String>,

    /// Description
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Priority (low, medium, high)
    #[arg(short, long)]
    pub priority: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct CreateTaskArgs {
    /// Title
    pub title: String,

    /// Parent epic ID (e.g. EPIC-2)
    #[arg(long)]
    pub epic: Option<String>,

    /// Kind: task, bug or research
    #[arg(short = 't', long = "kind", default_value = "task")]
    pub kind: String,

    /// Task IDs this task depends on (comma-separated)
    #[arg(long = "depends-on", value_delimiter = ',')]
    pub depends_on: Vec<String>,

    /// Description
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Priority (low, medium, high)
    #[arg(short, long)]
    pub priority: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct UpdateArgs {
    /// Entity ID
    pub id: String,

    /// New title
    #[arg(long)]
    pub title: Option<String>,

    /// New description
    #[arg(short, long)]
    pub description: Option<String>,

    /// New priority
    #[arg(short, long)]
    pub priority: Option<String>,

    /// New status (pending, in-progress, done, blocked, deferred)
    #[arg(short, long)]
    pub status: Option<String>,

    /// New parent ID
    #[arg(long, conflicts_with = "no_parent")]
    pub parent: Option<String>,

    /// Detach from the current parent
    #[arg(long)]
    pub no_parent: bool,

    /// Replace the dependency list (comma-separated task IDs)
    #[arg(long = "depends-on", value_delimiter = ',', conflicts_with = "clear_deps")]
    pub depends_on: Option<Vec<String>>,

    /// Remove all dependencies
    #[arg(long)]
    pub clear_deps: bool,
}

#[derive(Args, Debug, Default)]
pub struct DeleteArgs {
    /// Entity ID
    pub id: String,
}

#[derive(Args, Debug, Default)]
pub struct ShowArgs {
    /// Entity ID
    pub id: String,
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Entity type: idea, epic, task, bug, research, or `all-tasks` (default)
    #[arg(long = "type", default_value = "all-tasks")]
    pub entity_type: String,

    /// Filter by status
    #[arg(short, long)]
    pub status: Option<String>,

    /// Filter by priority
    #[arg(short, long)]
    pub priority: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct NextArgs {
    /// Only consider tasks with this priority
    #[arg(short, long)]
    pub priority: Option<String>,

    /// List every ready task in selection order
    #[arg(long)]
    pub all: bool,
}

#[derive(Args, Debug, Default)]
pub struct DepsArgs {
    /// Task ID
    pub id: String,
}

#[derive(Args, Debug, Default)]
pub struct NoteArgs {
    /// Entity ID
    pub id: String,

    /// Note text
    pub content: String,

    /// Note type: update, comment, blocker, completion
    #[arg(short = 't', long = "type", default_value = "update")]
    pub note_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_create_task_with_dependencies() {
        let cli = Cli::parse_from([
            "trellis",
            "create",
            "task",
            "Wire up auth",
            "--epic",
            "EPIC-2",
            "--depends-on",
            "TSK-3,TSK-4",
            "-p",
            "high",
        ]);
        let Commands::Create {
            command: CreateCommands::Task(args),
        } = cli.command
        else {
            panic!("expected create task");
        };
        assert_eq!(args.epic.as_deref(), Some("EPIC-2"));
        assert_eq!(args.depends_on, vec!["TSK-3", "TSK-4"]);
        assert_eq!(args.kind, "task");
    }

    #[test]
    fn log_format_flag_parses() {
        let cli = Cli::parse_from(["trellis", "list", "--log-format", "json"]);
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        assert!(Cli::try_parse_from(["trellis", "list", "--log-format", "xml"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["trellis", "next", "--json", "-vv", "--priority", "low"]);
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        let Commands::Next(args) = cli.command else {
            panic!("expected next");
        };
        assert_eq!(args.priority.as_deref(), Some("low"));
    }

    #[test]
    fn update_rejects_parent_with_no_parent() {
        let result = Cli::try_parse_from(["trellis", "update", "EPIC-1", "--parent", "IDEA-2", "--no-parent"]);
        assert!(result.is_err());
    }
}
