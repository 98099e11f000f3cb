//! # qoads common library
//!
//! Shared code for the qoads workspace:
//! - Error type for configuration loading
//! - TOML configuration path resolution and loading
//! - Sample-frame / wall-clock time conversions

pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
