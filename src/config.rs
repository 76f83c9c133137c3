//! Configuration for TinyCask
//!
//! Centralized configuration with sensible defaults. The data directory is
//! always passed in explicitly; the engine keeps no process-global state.

use std::path::PathBuf;

use crate::error::{CaskError, Result};
use crate::log::DataType;

/// Main configuration for a TinyCask store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding the store's files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── tinycask.data         (active log)
    ///     └── tinycask.data.merge   (transient, only during merge)
    pub data_dir: PathBuf,

    /// Type tag stamped on every record this store writes
    pub data_type: DataType,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// When to fsync the log
    pub sync_strategy: SyncStrategy,
}

/// Log sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// Only fsync on explicit `sync()` / transaction commit
    Manual,

    /// fsync after every put/delete (safest, slowest)
    EveryWrite,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./tinycask_data"),
            data_type: DataType::STRING,
            sync_strategy: SyncStrategy::Manual,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the config before opening a store
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(CaskError::Config("data_dir must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the type tag for written records
    pub fn data_type(mut self, data_type: DataType) -> Self {
        self.config.data_type = data_type;
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
