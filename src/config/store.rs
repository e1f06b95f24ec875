//! Cached configuration shared by the update cycle and the web interface.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::config::loader::{load_config, save_config, ConfigError};
use crate::config::migrate;
use crate::config::password::hash_password;
use crate::config::schema::DdnsConfig;

/// Lazily loaded, process-wide configuration snapshot.
///
/// Loading, migration and password reset happen before any background task
/// is spawned; afterwards the only writer is [`ConfigStore::save`].
pub struct ConfigStore {
    path: PathBuf,
    cached: ArcSwapOption<DdnsConfig>,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: ArcSwapOption::empty(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the configuration file exists on disk.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Cached configuration, reading the file on first use.
    pub fn cached(&self) -> Result<Arc<DdnsConfig>, ConfigError> {
        if let Some(config) = self.cached.load_full() {
            return Ok(config);
        }
        let config = Arc::new(load_config(&self.path)?);
        self.cached.store(Some(config.clone()));
        Ok(config)
    }

    /// Like [`cached`](Self::cached), but a missing file yields defaults.
    pub fn cached_or_default(&self) -> Result<Arc<DdnsConfig>, ConfigError> {
        match self.cached() {
            Err(e) if e.is_not_found() => {
                let config = Arc::new(DdnsConfig::default());
                self.cached.store(Some(config.clone()));
                Ok(config)
            }
            other => other,
        }
    }

    /// Current snapshot; defaults if nothing could be loaded.
    pub fn current(&self) -> Arc<DdnsConfig> {
        self.cached
            .load_full()
            .unwrap_or_else(|| Arc::new(DdnsConfig::default()))
    }

    /// Persist a configuration and publish it as the new snapshot.
    pub fn save(&self, config: DdnsConfig) -> Result<(), ConfigError> {
        save_config(&self.path, &config)?;
        self.cached.store(Some(Arc::new(config)));
        Ok(())
    }

    /// Replace the web password of an existing configuration.
    pub fn reset_password(&self, password: &str) -> Result<(), ConfigError> {
        let mut config = (*self.cached()?).clone();
        config.password = hash_password(password);
        self.save(config)
    }

    /// Normalize the cached configuration, rewriting the file if it exists and changed.
    pub fn migrate(&self) -> Result<bool, ConfigError> {
        let mut config = (*self.cached_or_default()?).clone();
        if !migrate::normalize(&mut config) {
            return Ok(false);
        }
        if self.exists() {
            self.save(config)?;
        } else {
            self.cached.store(Some(Arc::new(config)));
        }
        Ok(true)
    }
}
