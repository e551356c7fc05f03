//! Subcommand implementations.

pub mod create;
pub mod delete;
pub mod dep;
pub mod init;
pub mod list;
pub mod next;
pub mod note;
pub mod show;
pub mod update;

use crate::config::{self, ConfigLayer};
use crate::error::{Result, TrellisError};
use crate::model::Priority;
use crate::tracker::Tracker;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Discover the workspace and open a tracker on it.
///
/// With `--db` and no workspace in sight, the database's own directory
/// stands in for the workspace.
///
/// # Errors
///
/// `NotInitialized` when no workspace is found, or any open/config error.
pub fn open_tracker(cli: &config::CliOverrides) -> Result<(Tracker, ConfigLayer)> {
    let trellis_dir = match config::discover_trellis_dir(None) {
        Ok(dir) => dir,
        Err(TrellisError::NotInitialized) if cli.db.is_some() => db_parent(cli.db.as_deref()),
        Err(e) => return Err(e),
    };
    debug!(dir = %trellis_dir.display(), "Using workspace");

    let (storage, _paths, layer) = config::open_storage(&trellis_dir, cli)?;
    Ok((Tracker::new(storage), layer))
}

fn db_parent(db: Option<&Path>) -> PathBuf {
    db.and_then(Path::parent)
        .filter(|parent| !parent.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Parse an optional priority flag.
pub(crate) fn parse_priority(value: Option<&str>) -> Result<Option<Priority>> {
    value.map(Priority::from_str).transpose()
}

/// Priority flag, or the configured default when absent.
pub(crate) fn priority_or_default(value: Option<&str>, layer: &ConfigLayer) -> Result<Priority> {
    match parse_priority(value)? {
        Some(priority) => Ok(priority),
        None => config::default_priority_from_layer(layer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_parent_falls_back_to_cwd() {
        assert_eq!(db_parent(None), PathBuf::from("."));
        assert_eq!(db_parent(Some(Path::new("work.db"))), PathBuf::from("."));
        assert_eq!(
            db_parent(Some(Path::new("/tmp/ws/work.db"))),
            PathBuf::from("/tmp/ws")
        );
    }

    #[test]
    fn configured_default_priority_applies() {
        let mut layer = ConfigLayer::default();
        layer.set("default-priority", "high");
        assert_eq!(priority_or_default(None, &layer).unwrap(), Priority::High);
        assert_eq!(
            priority_or_default(Some("low"), &layer).unwrap(),
            Priority::Low
        );
        assert!(priority_or_default(Some("urgent"), &layer).is_err());
    }
}
