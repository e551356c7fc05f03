//! Output routing for the CLI: colored text, plain text, JSON or nothing.

use crate::model::{EntityType, Priority, Status};
use crossterm::style::{Stylize, style};
use serde::Serialize;
use std::io::IsTerminal;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Status icon characters.
pub mod icons {
    pub const PENDING: &str = "○";
    pub const IN_PROGRESS: &str = "◐";
    pub const BLOCKED: &str = "●";
    pub const DEFERRED: &str = "❄";
    pub const DONE: &str = "✓";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Text with ANSI colors
    Color,
    /// Plain text, no ANSI codes (for piping)
    Plain,
    /// JSON output only
    Json,
    /// Minimal output (quiet mode)
    Quiet,
}

/// Central output coordinator that respects json/quiet modes.
#[derive(Debug, Clone, Copy)]
pub struct OutputContext {
    mode: OutputMode,
    width: usize,
}

impl OutputContext {
    /// Create from CLI-style flags.
    #[must_use]
    pub fn from_flags(json: bool, quiet: bool, no_color: bool) -> Self {
        let mode = if json {
            OutputMode::Json
        } else if quiet {
            OutputMode::Quiet
        } else if no_color || std::env::var("NO_COLOR").is_ok() || !std::io::stdout().is_terminal()
        {
            OutputMode::Plain
        } else {
            OutputMode::Color
        };

        let width = crossterm::terminal::size().map_or(100, |(cols, _)| usize::from(cols));
        Self { mode, width }
    }

    #[must_use]
    pub const fn mode(&self) -> OutputMode {
        self.mode
    }

    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.mode == OutputMode::Quiet
    }

    #[must_use]
    pub fn use_color(&self) -> bool {
        self.mode == OutputMode::Color
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Print a line of human-readable text.
    pub fn print(&self, content: &str) {
        if matches!(self.mode, OutputMode::Color | OutputMode::Plain) {
            println!("{content}");
        }
    }

    /// Print pretty JSON; only in JSON mode.
    pub fn json_pretty<T: Serialize>(&self, value: &T) {
        if self.is_json() {
            match serde_json::to_string_pretty(value) {
                Ok(text) => println!("{text}"),
                Err(e) => eprintln!("Failed to serialize output: {e}"),
            }
        }
    }

    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Color => println!("{} {message}", "✓".green().bold()),
            OutputMode::Plain => println!("✓ {message}"),
            OutputMode::Quiet | OutputMode::Json => {}
        }
    }

    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Color => eprintln!("{} {}", "⚠".yellow().bold(), style(message).yellow()),
            OutputMode::Plain => eprintln!("Warning: {message}"),
            OutputMode::Quiet | OutputMode::Json => {}
        }
    }

    /// One-line summary: icon, id, priority, title.
    #[must_use]
    pub fn entity_line(
        &self,
        formatted_id: &str,
        status: Status,
        priority: Priority,
        title: &str,
    ) -> String {
        let color = self.use_color();
        let prefix = format!(
            "{} {formatted_id} {} ",
            status_icon(status, color),
            priority_badge(priority, color)
        );
        // Badge ANSI codes do not take columns; measure the plain form.
        let used = status_icon(status, false).width()
            + formatted_id.width()
            + priority_badge(priority, false).width()
            + 3;
        let room = self.width.saturating_sub(used).max(20);
        format!("{prefix}{}", truncate_title(title, room))
    }
}

#[must_use]
pub const fn status_icon_plain(status: Status) -> &'static str {
    match status {
        Status::Pending => icons::PENDING,
        Status::InProgress => icons::IN_PROGRESS,
        Status::Blocked => icons::BLOCKED,
        Status::Deferred => icons::DEFERRED,
        Status::Done => icons::DONE,
    }
}

#[must_use]
pub fn status_icon(status: Status, use_color: bool) -> String {
    let icon = status_icon_plain(status);
    if !use_color {
        return icon.to_string();
    }
    match status {
        Status::Pending => icon.green().to_string(),
        Status::InProgress => icon.yellow().to_string(),
        Status::Blocked => icon.red().to_string(),
        Status::Deferred => icon.blue().to_string(),
        Status::Done => icon.dark_grey().to_string(),
    }
}

#[must_use]
pub fn priority_badge(priority: Priority, use_color: bool) -> String {
    let label = format!("[{priority}]");
    if !use_color {
        return label;
    }
    match priority {
        Priority::High => label.red().bold().to_string(),
        Priority::Medium => label.yellow().to_string(),
        Priority::Low => label.dark_grey().to_string(),
    }
}

#[must_use]
pub fn type_badge(kind: EntityType) -> String {
    format!("[{kind}]")
}

/// Truncate to `max_width` display columns, ending in `…` when cut.
#[must_use]
pub fn truncate_title(title: &str, max_width: usize) -> String {
    if title.width() <= max_width {
        return title.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in title.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}
