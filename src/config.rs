//! Index configuration
//!
//! Settings are layered, later sources winning:
//!
//! ```text
//! built-in defaults
//!   └─→ TOML file (optional)
//!        └─→ STOCKINDEX_* environment variables
//! ```

use crate::error::{Error, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Prefix for environment overrides, e.g. `STOCKINDEX_CAPACITY=50`
pub const ENV_PREFIX: &str = "STOCKINDEX";

/// Default slot table capacity
pub const DEFAULT_CAPACITY: usize = 20;

/// Largest accepted slot table capacity
pub const MAX_CAPACITY: usize = 1 << 20;

/// Product index configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Number of cells in the slot table, fixed for the index lifetime
    pub capacity: usize,
    /// Pre-load the sample products on startup
    pub seed_samples: bool,
    /// Require keys of the form `A-123`
    pub strict_keys: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            seed_samples: false,
            strict_keys: false,
        }
    }
}

impl IndexConfig {
    /// Load from an optional file plus `STOCKINDEX_*` variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    /// Load using a custom environment prefix
    pub fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            debug!(path = ?path, "Loading index configuration file");
            builder = builder.add_source(File::from(path).required(true));
        }

        let config: Self = builder
            .add_source(Environment::with_prefix(env_prefix).try_parsing(true))
            .build()
            .map_err(|e| Error::Config(format!("Failed to load configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| Error::Config(format!("Failed to parse configuration: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document directly
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to render TOML: {}", e)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::Config("capacity must be at least 1".to_string()));
        }
        if self.capacity > MAX_CAPACITY {
            return Err(Error::Config(format!(
                "capacity {} exceeds the maximum of {}",
                self.capacity, MAX_CAPACITY
            )));
        }
        Ok(())
    }
}
