//! Persistence of the per-repository configuration.

use super::{ConfigUpdate, StoreConfig};
use crate::storage::{StoragePort, StorePaths};
use crate::{Error, Result};
use std::sync::Arc;
use tracing::instrument;

/// Reads and writes `config.json`.
///
/// A missing or unparsable file, including one that is not valid UTF-8, is
/// replaced with defaults on first access.
#[derive(Clone)]
pub struct ConfigurationStore {
    port: Arc<dyn StoragePort>,
    paths: StorePaths,
}

impl ConfigurationStore {
    /// Creates a configuration store.
    #[must_use]
    pub fn new(port: Arc<dyn StoragePort>, paths: StorePaths) -> Self {
        Self { port, paths }
    }

    /// Returns the configuration, materializing defaults when needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, or if defaults cannot be
    /// written.
    #[instrument(skip(self), fields(path = %self.paths.config_path().display()))]
    pub fn get(&self) -> Result<StoreConfig> {
        let path = self.paths.config_path();

        let Some(raw) = self.port.read_bytes(&path)? else {
            tracing::debug!("No configuration file, writing defaults");
            let config = StoreConfig::default();
            self.persist(&config)?;
            return Ok(config);
        };

        match serde_json::from_slice::<StoreConfig>(&raw) {
            Ok(mut config) => {
                config.fill_missing_tools();
                Ok(config)
            },
            Err(e) => {
                tracing::warn!(error = %e, "Configuration file is corrupt, restoring defaults");
                let config = StoreConfig::default();
                self.persist(&config)?;
                Ok(config)
            },
        }
    }

    /// Merges `update` into the current configuration and persists it.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be read or written.
    #[instrument(skip(self, update))]
    pub fn update(&self, update: ConfigUpdate) -> Result<StoreConfig> {
        let mut config = self.get()?;
        config.apply(update);
        self.persist(&config)?;
        tracing::info!("Configuration updated");
        Ok(config)
    }

    /// Overwrites the configuration with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn reset(&self) -> Result<StoreConfig> {
        let config = StoreConfig::default();
        self.persist(&config)?;
        Ok(config)
    }

    fn persist(&self, config: &StoreConfig) -> Result<()> {
        let json = serde_json::to_vec_pretty(config)
            .map_err(|e| Error::failed("serialize_config", e))?;
        self.port.write_atomic(&self.paths.config_path(), &json)
    }
}
