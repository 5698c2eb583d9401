//! Crate configuration loaded from TOML
//!
//! ```toml
//! [geometry]
//! precision = 3
//!
//! [attributes]
//! cycle_policy = "strict"
//! transform_precision = 1
//! ```
//!
//! Every field is optional.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::attributes::EngineConfig;
use crate::geometry::DEFAULT_PRECISION;

/// Errors that can occur when loading configuration or scene files
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Arc-length settings for geometry queries
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Fractional digits of length accuracy for curve flattening
    pub precision: u32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub geometry: GeometryConfig,
    pub attributes: EngineConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
