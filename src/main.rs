use clap::Parser;
use std::io::{self, IsTerminal};
use trellis::cli::commands;
use trellis::cli::{Cli, Commands};
use trellis::config;
use trellis::logging::init_logging;
use trellis::output::OutputContext;
use trellis::{StructuredError, TrellisError};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet, cli.log_format) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let overrides = build_cli_overrides(&cli);
    let ctx = OutputContext::from_flags(cli.json, cli.quiet, cli.no_color);

    let result = match &cli.command {
        Commands::Init(args) => commands::init::execute(args.force, None, &ctx),
        Commands::Create { command } => commands::create::execute(command, &ctx, &overrides),
        Commands::Update(args) => commands::update::execute(args, &ctx, &overrides),
        Commands::Delete(args) => commands::delete::execute(args, &ctx, &overrides),
        Commands::Show(args) => commands::show::execute(args, &ctx, &overrides),
        Commands::List(args) => commands::list::execute(args, &ctx, &overrides),
        Commands::Next(args) => commands::next::execute(args, &ctx, &overrides),
        Commands::Deps(args) => commands::dep::execute(args, &ctx, &overrides),
        Commands::Note(args) => commands::note::execute(args, &ctx, &overrides),
        Commands::Cycles => commands::dep::execute_cycles(&ctx, &overrides),
    };

    if let Err(e) = result {
        handle_error(&e, cli.json);
    }
}

/// Handle errors with structured output support.
///
/// When --json is set or stdout is not a TTY, outputs structured JSON to stderr.
/// Otherwise, outputs human-readable error with optional color.
fn handle_error(err: &TrellisError, json_mode: bool) -> ! {
    let structured = StructuredError::from_error(err);
    let exit_code = structured.code.exit_code();

    let use_json = json_mode || !io::stdout().is_terminal();

    if use_json {
        let json = structured.to_json();
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
        );
    } else {
        let use_color = io::stderr().is_terminal();
        eprintln!("{}", structured.to_human(use_color));
    }

    std::process::exit(exit_code);
}

fn build_cli_overrides(cli: &Cli) -> config::CliOverrides {
    config::CliOverrides {
        db: cli.db.clone(),
        lock_timeout: cli.lock_timeout,
    }
}
