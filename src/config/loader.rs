//! Configuration loading from disk.
//!
//! A base file is read first; an optional local overlay (secrets, per-host
//! endpoints) is merged on top of it table by table before deserialization.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml::Value;

use crate::config::schema::MinterConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {source}")]
    Schema {
        #[source]
        source: toml::de::Error,
    },

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<MinterConfig, ConfigError> {
    load_config_with_overlay(path, None)
}

/// Load the base file, merge the overlay if it exists, then validate.
///
/// A missing overlay is not an error; a missing base file is.
pub fn load_config_with_overlay(
    base: &Path,
    overlay: Option<&Path>,
) -> Result<MinterConfig, ConfigError> {
    let mut merged = read_table(base)?;

    if let Some(local) = overlay {
        if local.exists() {
            let local_table = read_table(local)?;
            merge_values(&mut merged, local_table);
            tracing::debug!(path = %local.display(), "Merged local config overlay");
        } else {
            tracing::debug!(path = %local.display(), "Local config overlay not present");
        }
    }

    let config = merged
        .try_into::<MinterConfig>()
        .map_err(|source| ConfigError::Schema { source })?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn read_table(path: &Path) -> Result<Value, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_table(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_table(content: &str) -> Result<Value, toml::de::Error> {
    if content.trim().is_empty() {
        return Ok(Value::Table(toml::map::Map::new()));
    }
    toml::from_str(content)
}

/// Recursively merge `overlay` into `base`.
///
/// Tables merge key by key; any other value in the overlay replaces the base.
pub fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Table(base_table), Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                let nested = value.is_table() && base_table.get(&key).is_some_and(Value::is_table);
                match base_table.get_mut(&key) {
                    Some(existing) if nested => merge_values(existing, value),
                    _ => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
