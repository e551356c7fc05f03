use crate::config::{Metadata, TRELLIS_DIR_NAME};
use crate::error::{Result, TrellisError};
use crate::output::OutputContext;
use crate::storage::SqliteStorage;
use anyhow::Context;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Serialize)]
struct InitResult {
    path: String,
    database: String,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns an error if the directory or database cannot be created.
pub fn execute(force: bool, root_dir: Option<&Path>, ctx: &OutputContext) -> Result<()> {
    let base_dir = root_dir.unwrap_or_else(|| Path::new("."));
    let trellis_dir = base_dir.join(TRELLIS_DIR_NAME);

    let metadata = if trellis_dir.exists() {
        Metadata::load(&trellis_dir)?
    } else {
        fs::create_dir(&trellis_dir)
            .with_context(|| format!("failed to create {}", trellis_dir.display()))?;
        Metadata::default()
    };

    let db_path = trellis_dir.join(&metadata.database);
    if db_path.exists() {
        if !force {
            return Err(TrellisError::AlreadyInitialized { path: db_path });
        }
        for suffix in ["", "-wal", "-shm"] {
            let mut file = db_path.clone().into_os_string();
            file.push(suffix);
            let file = Path::new(&file);
            if file.exists() {
                fs::remove_file(file)
                    .with_context(|| format!("failed to remove {}", file.display()))?;
            }
        }
        info!(db = %db_path.display(), "Removed existing database");
    }

    // Opening applies the schema.
    SqliteStorage::open(&db_path)?;
    metadata.save(&trellis_dir)?;

    let config_path = trellis_dir.join("config.yaml");
    if !config_path.exists() {
        let config = r"# Trellis project configuration
# default-priority: medium
# lock-timeout: 30000
";
        fs::write(&config_path, config)
            .with_context(|| format!("failed to write {}", config_path.display()))?;
    }

    let gitignore_path = trellis_dir.join(".gitignore");
    if !gitignore_path.exists() {
        let gitignore = r"*.db
*.db-shm
*.db-wal
";
        fs::write(&gitignore_path, gitignore)
            .with_context(|| format!("failed to write {}", gitignore_path.display()))?;
    }

    info!(dir = %trellis_dir.display(), "Initialized workspace");
    if ctx.is_json() {
        ctx.json_pretty(&InitResult {
            path: trellis_dir.display().to_string(),
            database: metadata.database,
        });
    } else {
        ctx.success(&format!("Initialized trellis workspace in {TRELLIS_DIR_NAME}/"));
    }
    Ok(())
}
