//! Process configuration and the runtime context derived from it.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::loader::ConfigError;

/// Listen address used when `-l` is not given.
pub const DEFAULT_LISTEN_ADDRESS: &str = ":9876";

/// File name of the configuration file in the home directory.
pub const DEFAULT_CONFIG_FILE_NAME: &str = ".ddns_agent_config.toml";

/// Settings parsed from the command line. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    /// Print the version and exit.
    pub print_version: bool,

    /// Web listen address (`host:port`, `:port` for all interfaces).
    pub listen_address: String,

    /// Seconds between update cycles.
    pub update_interval_secs: u64,

    /// Unchanged-IP observations before a record is pushed again anyway.
    pub cache_times: u32,

    /// Configuration file; `None` selects the default location.
    pub config_file: Option<PathBuf>,

    /// Serve the web configuration interface.
    pub web_enabled: bool,

    /// Accept invalid TLS certificates on outbound calls.
    pub skip_verify: bool,

    /// Resolver used instead of the system one.
    pub custom_dns: Option<String>,

    /// One-shot password reset mode.
    pub reset_password: Option<String>,

    /// Build version string.
    pub version: String,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            print_version: false,
            listen_address: DEFAULT_LISTEN_ADDRESS.to_string(),
            update_interval_secs: 300,
            cache_times: 5,
            config_file: None,
            web_enabled: true,
            skip_verify: false,
            custom_dns: None,
            reset_password: None,
            version: crate::VERSION.to_string(),
        }
    }
}

impl ProcessConfig {
    /// Interval between update cycles.
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs.max(1))
    }
}

/// Values derived during bootstrap and handed to every collaborator.
///
/// Written exactly once, before any background task exists.
#[derive(Debug, Clone)]
pub struct RuntimeContext {
    pub version: String,
    pub config_path: PathBuf,
    pub cache_times: u32,
    pub custom_dns: Option<String>,
    pub skip_verify: bool,
    pub listen: SocketAddr,
}

impl RuntimeContext {
    /// Derive the context from validated process settings.
    pub fn resolve(process: &ProcessConfig, listen: SocketAddr) -> Result<Self, ConfigError> {
        let config_path = match &process.config_file {
            Some(path) => absolute(path)?,
            None => default_config_path()?,
        };

        Ok(Self {
            version: process.version.clone(),
            config_path,
            cache_times: process.cache_times,
            custom_dns: process.custom_dns.clone(),
            skip_verify: process.skip_verify,
            listen,
        })
    }
}

/// `~/.ddns_agent_config.toml`, falling back to the working directory.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    match dirs::home_dir() {
        Some(home) => Ok(home.join(DEFAULT_CONFIG_FILE_NAME)),
        None => absolute(Path::new(DEFAULT_CONFIG_FILE_NAME)),
    }
}

fn absolute(path: &Path) -> Result<PathBuf, ConfigError> {
    std::path::absolute(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
