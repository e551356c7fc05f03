//! Tracing setup for the binary and for tests.
//!
//! Logs go to stderr so stdout stays clean for command output.
//! `RUST_LOG` overrides the level chosen from `-v` / `-q`.

use crate::error::{Result, TrellisError};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = TrellisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(TrellisError::Config(format!(
                "unknown log format '{other}' (expected pretty or json)"
            ))),
        }
    }
}

/// Level directive for the given verbosity flags.
#[must_use]
pub const fn level_for(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns `Config` if a subscriber is already installed.
pub fn init_logging(verbose: u8, quiet: bool, format: Option<LogFormat>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("trellis={}", level_for(verbose, quiet))));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose > 1);

    let installed = match format.unwrap_or_default() {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| TrellisError::Config(format!("logging already initialized: {e}")))
}

/// Install a test-writer subscriber; repeated calls are no-ops.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trellis=debug")),
        )
        .with_test_writer()
        .try_init();
}
