//! Configuration management for `trellis`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`TRELLIS_*`)
//! 3. Project config (.trellis/config.yaml)
//! 4. User config (~/.config/trellis/config.yaml)
//! 5. Defaults

use crate::error::{Result, TrellisError};
use crate::model::Priority;
use crate::storage::SqliteStorage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Name of the workspace directory.
pub const TRELLIS_DIR_NAME: &str = ".trellis";
/// Default database filename used when metadata is missing.
const DEFAULT_DB_FILENAME: &str = "trellis.db";
/// Busy timeout applied when nothing else is configured.
const DEFAULT_LOCK_TIMEOUT_MS: u64 = 30_000;
/// Environment variable naming the workspace directory directly.
const DIR_ENV_VAR: &str = "TRELLIS_DIR";

/// Workspace metadata (`metadata.json`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Metadata {
    pub database: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            database: DEFAULT_DB_FILENAME.to_string(),
        }
    }
}

impl Metadata {
    /// Load metadata.json from the workspace directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(trellis_dir: &Path) -> Result<Self> {
        let path = trellis_dir.join("metadata.json");
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(&path)?;
        let mut metadata: Self = serde_json::from_str(&contents)?;

        if metadata.database.trim().is_empty() {
            metadata.database = DEFAULT_DB_FILENAME.to_string();
        }

        Ok(metadata)
    }

    /// Write metadata.json into the workspace directory.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, trellis_dir: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(trellis_dir.join("metadata.json"), contents)?;
        Ok(())
    }
}

/// Resolved paths for this workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub trellis_dir: PathBuf,
    pub db_path: PathBuf,
    pub metadata: Metadata,
}

impl ConfigPaths {
    /// Resolve the database path from metadata and an optional override.
    ///
    /// # Errors
    ///
    /// Returns an error if metadata cannot be read.
    pub fn resolve(trellis_dir: &Path, db_override: Option<&PathBuf>) -> Result<Self> {
        let metadata = Metadata::load(trellis_dir)?;
        let db_path = db_override.cloned().unwrap_or_else(|| {
            let candidate = PathBuf::from(&metadata.database);
            if candidate.is_absolute() {
                candidate
            } else {
                trellis_dir.join(candidate)
            }
        });

        Ok(Self {
            trellis_dir: trellis_dir.to_path_buf(),
            db_path,
            metadata,
        })
    }
}

/// Discover the active `.trellis` directory.
///
/// Honors `TRELLIS_DIR` when set, otherwise walks up from `start` (or CWD).
///
/// # Errors
///
/// Returns `NotInitialized` if no workspace is found.
pub fn discover_trellis_dir(start: Option<&Path>) -> Result<PathBuf> {
    discover_trellis_dir_with_env(start, None)
}

fn discover_trellis_dir_with_env(
    start: Option<&Path>,
    env_override: Option<&Path>,
) -> Result<PathBuf> {
    if let Some(path) = env_override {
        if path.is_dir() {
            return Ok(path.to_path_buf());
        }
    } else if let Ok(value) = env::var(DIR_ENV_VAR) {
        if !value.trim().is_empty() {
            let path = PathBuf::from(value);
            if path.is_dir() {
                return Ok(path);
            }
        }
    }

    let mut current = match start {
        Some(path) => path.to_path_buf(),
        None => env::current_dir()?,
    };

    loop {
        let candidate = current.join(TRELLIS_DIR_NAME);
        if candidate.is_dir() {
            return Ok(candidate);
        }

        if !current.pop() {
            break;
        }
    }

    Err(TrellisError::NotInitialized)
}

/// Open storage for a workspace, returning the storage, the paths used and
/// the merged configuration.
///
/// # Errors
///
/// Returns an error if config cannot be read or the database cannot be opened.
pub fn open_storage(
    trellis_dir: &Path,
    cli: &CliOverrides,
) -> Result<(SqliteStorage, ConfigPaths, ConfigLayer)> {
    let layer = load_config(trellis_dir, cli)?;
    let db_override = db_override_from_layer(&layer);
    let lock_timeout = lock_timeout_from_layer(&layer)?;
    let paths = ConfigPaths::resolve(trellis_dir, db_override.as_ref())?;

    debug!(db = %paths.db_path.display(), lock_timeout, "Opening workspace database");
    let storage = SqliteStorage::open_with_timeout(&paths.db_path, Some(lock_timeout))?;
    Ok((storage, paths, layer))
}

/// One source of configuration as normalized key/value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub values: HashMap<String, String>,
}

impl ConfigLayer {
    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&contents)?;
        Ok(layer_from_yaml_value(&value))
    }

    /// Build a layer from `TRELLIS_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(env::vars())
    }

    fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut layer = Self::default();
        for (key, value) in vars {
            if key == DIR_ENV_VAR {
                continue;
            }
            if let Some(stripped) = key.strip_prefix("TRELLIS_") {
                layer.set(stripped, value);
            }
        }
        layer
    }

    /// Insert a value under its normalized key.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(normalize_key(key), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&normalize_key(key)).map(String::as_str)
    }
}

/// CLI overrides for config loading.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub db: Option<PathBuf>,
    pub lock_timeout: Option<u64>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();

        if let Some(path) = &self.db {
            layer.set("db", path.to_string_lossy());
        }
        if let Some(lock_timeout) = self.lock_timeout {
            layer.set("lock-timeout", lock_timeout.to_string());
        }

        layer
    }
}

/// Load project config (.trellis/config.yaml).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(trellis_dir: &Path) -> Result<ConfigLayer> {
    ConfigLayer::from_yaml(&trellis_dir.join("config.yaml"))
}

/// Load user config (~/.config/trellis/config.yaml).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<ConfigLayer> {
    let Ok(home) = env::var("HOME") else {
        return Ok(ConfigLayer::default());
    };
    let path = Path::new(&home)
        .join(".config")
        .join("trellis")
        .join("config.yaml");
    ConfigLayer::from_yaml(&path)
}

/// Default config layer (lowest precedence).
#[must_use]
pub fn default_config_layer() -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    layer.set("default-priority", Priority::default().as_str());
    layer.set("lock-timeout", DEFAULT_LOCK_TIMEOUT_MS.to_string());
    layer
}

/// Load configuration with the full precedence order.
///
/// # Errors
///
/// Returns an error if any config file cannot be read or parsed.
pub fn load_config(trellis_dir: &Path, cli: &CliOverrides) -> Result<ConfigLayer> {
    Ok(ConfigLayer::merge_layers(&[
        default_config_layer(),
        load_user_config()?,
        load_project_config(trellis_dir)?,
        ConfigLayer::from_env(),
        cli.as_layer(),
    ]))
}

/// Resolve default priority for new entities from config.
///
/// # Errors
///
/// Returns an error if the configured value is not low, medium or high.
pub fn default_priority_from_layer(layer: &ConfigLayer) -> Result<Priority> {
    layer
        .get("default-priority")
        .map_or_else(|| Ok(Priority::default()), Priority::from_str)
}

fn db_override_from_layer(layer: &ConfigLayer) -> Option<PathBuf> {
    layer
        .get("db")
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn lock_timeout_from_layer(layer: &ConfigLayer) -> Result<u64> {
    layer.get("lock-timeout").map_or(Ok(DEFAULT_LOCK_TIMEOUT_MS), |value| {
        value.trim().parse::<u64>().map_err(|_| {
            TrellisError::Config(format!("lock-timeout must be milliseconds, got '{value}'"))
        })
    })
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('_', "-")
}

fn layer_from_yaml_value(value: &serde_yaml::Value) -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    let mut flat = HashMap::new();
    flatten_yaml(value, "", &mut flat);

    for (key, value) in flat {
        layer.set(&key, value);
    }

    layer
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = key.as_str() else {
                    continue;
                };
                let next_prefix = if prefix.is_empty() {
                    key_str.to_string()
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(value, &next_prefix, out);
            }
        }
        serde_yaml::Value::Sequence(values) => {
            let joined = values
                .iter()
                .filter_map(yaml_scalar_to_string)
                .collect::<Vec<_>>()
                .join(",");
            out.insert(prefix.to_string(), joined);
        }
        _ => {
            if let Some(value) = yaml_scalar_to_string(value) {
                out.insert(prefix.to_string(), value);
            }
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(v) => Some(v.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
    }
}
