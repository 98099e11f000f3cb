//! Configuration file resolution and TOML loading
//!
//! Config file lookup follows a fixed priority order:
//! 1. Command-line argument (highest priority)
//! 2. `QOADS_CONFIG` environment variable
//! 3. Platform config directory (`<config_dir>/qoads/config.toml`), if present
//! 4. No file: built-in defaults
//!
//! A missing file never aborts startup; a file that exists but does not parse does.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "QOADS_CONFIG";

const APP_DIR_NAME: &str = "qoads";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Log levels accepted in `[logging] level`
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Reject levels `tracing` would not understand.
    pub fn validate(&self) -> Result<()> {
        if LOG_LEVELS.contains(&self.level.to_ascii_lowercase().as_str()) {
            Ok(())
        } else {
            Err(Error::InvalidInput(format!(
                "unknown log level '{}' (expected one of {})",
                self.level,
                LOG_LEVELS.join(", ")
            )))
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Default per-user config file location for the platform.
///
/// `~/.config/qoads/config.toml` on Linux, `~/Library/Application Support/qoads/config.toml`
/// on macOS, `%APPDATA%\qoads\config.toml` on Windows.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Resolve which config file to use, if any.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    default_config_path().filter(|p| p.exists())
}

/// Parse a TOML file into `T`.
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Load `T` from `path`, falling back to `T::default()` when there is no file.
pub fn load_or_default<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    match path {
        None => {
            debug!("No config file found, using built-in defaults");
            Ok(T::default())
        }
        Some(p) if !p.exists() => {
            warn!("Config file {} does not exist, using built-in defaults", p.display());
            Ok(T::default())
        }
        Some(p) => {
            debug!("Loading config from {}", p.display());
            load_toml(p)
        }
    }
}
