//! Configuration file loading
//!
//! Settings resolve in this priority order (highest first):
//! 1. Command-line argument
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default
//!
//! Tiers 1 and 2 belong to each binary's argument parser. This module owns
//! tier 3: locating and parsing the TOML file. A missing file is never fatal
//! (the caller falls back to defaults); a file that exists but does not parse
//! is a configuration error.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Directory name under the platform config dir
const CONFIG_DIR_NAME: &str = "idv";

/// Default TOML path for a module: `<config_dir>/idv/<module>.toml`
///
/// Returns None on platforms without a config directory.
pub fn default_config_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(format!("{}.toml", module_name)))
}

/// Pick the TOML path to load: explicit path wins, else the module default
pub fn resolve_config_path(explicit: Option<&Path>, module_name: &str) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path(module_name),
    }
}

/// Parse a TOML file into `T`
///
/// Returns `Ok(None)` when the file does not exist.
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)?;
    let parsed = toml::from_str::<T>(&content)
        .map_err(|e| Error::Config(format!("Parse TOML {} failed: {}", path.display(), e)))?;

    info!("Loaded configuration from {}", path.display());
    Ok(Some(parsed))
}

/// Parse a TOML file into `T`, falling back to `T::default()` when absent
pub fn load_toml_or_default<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    let Some(path) = path else {
        return Ok(T::default());
    };

    match load_toml(path)? {
        Some(config) => Ok(config),
        None => {
            warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            );
            Ok(T::default())
        }
    }
}
