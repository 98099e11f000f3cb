//! Configuration for qoads-dec
//!
//! One TOML file, located through `qoads_common::config` (CLI argument,
//! `QOADS_CONFIG`, then the platform config directory). Every field has a
//! built-in default, so an absent file or an empty table is valid.
//!
//! ```toml
//! [decoder]
//! backend_priority = ["qoa", "wav"]
//! loading = "stream"
//! worker_chunk_frames = 4096
//! worker_queue_depth = 4
//!
//! [logging]
//! level = "info"
//! ```

use crate::audio::BackendKind;
use crate::context::LoadingMethod;
use crate::error::{Error, Result};
use qoads_common::config::{load_or_default, resolve_config_path, LoggingConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub decoder: DecoderSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Decoder and context settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoderSettings {
    /// Order in which container formats are probed
    #[serde(default = "default_backend_priority")]
    pub backend_priority: Vec<BackendKind>,

    /// How `AudioContext::open` loads registered data
    #[serde(default)]
    pub loading: LoadingMethod,

    /// Sample-frames per chunk handed off by the decode worker
    #[serde(default = "default_worker_chunk_frames")]
    pub worker_chunk_frames: u64,

    /// Chunks the decode worker may run ahead of its consumer
    #[serde(default = "default_worker_queue_depth")]
    pub worker_queue_depth: usize,
}

impl Default for DecoderSettings {
    fn default() -> Self {
        Self {
            backend_priority: default_backend_priority(),
            loading: LoadingMethod::default(),
            worker_chunk_frames: default_worker_chunk_frames(),
            worker_queue_depth: default_worker_queue_depth(),
        }
    }
}

impl DecoderSettings {
    pub fn validate(&self) -> Result<()> {
        if self.backend_priority.is_empty() {
            return Err(Error::Config("decoder.backend_priority is empty".to_string()));
        }
        if self.worker_chunk_frames == 0 {
            return Err(Error::Config("decoder.worker_chunk_frames must be > 0".to_string()));
        }
        if self.worker_queue_depth == 0 {
            return Err(Error::Config("decoder.worker_queue_depth must be > 0".to_string()));
        }
        Ok(())
    }
}

fn default_backend_priority() -> Vec<BackendKind> {
    BackendKind::DEFAULT_PRIORITY.to_vec()
}

fn default_worker_chunk_frames() -> u64 {
    4096
}

fn default_worker_queue_depth() -> usize {
    4
}

impl TomlConfig {
    /// Resolve, load and validate the configuration.
    ///
    /// A missing file yields defaults; a malformed or invalid one is an error.
    pub fn load(cli_arg: Option<&Path>) -> Result<Self> {
        let path = resolve_config_path(cli_arg);
        let config: TomlConfig = load_or_default(path.as_deref())?;
        config.validate()?;

        if let Some(path) = &path {
            info!("Configuration resolved from {}", path.display());
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.decoder.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
