//! Harvester configuration.
//!
//! Loaded from a TOML file; every key is optional:
//!
//! ```toml
//! concurrency = 4
//! request_timeout_secs = 30
//! user_agent = "dkan-harvester/0.1.0"
//! license_file = "licenses.json"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::license::{LicenseError, StaticLicenseRegistry};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Licenses(#[from] LicenseError),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HarvesterConfig {
    /// Identifiers fetched and normalized at the same time (1 = sequential)
    pub concurrency: usize,

    /// Per-request timeout for every remote call
    pub request_timeout_secs: u64,

    pub user_agent: String,

    /// JSON license list replacing the stock CKAN licenses
    pub license_file: Option<PathBuf>,
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            request_timeout_secs: 30,
            user_agent: concat!("dkan-harvester/", env!("CARGO_PKG_VERSION")).to_string(),
            license_file: None,
        }
    }
}

impl HarvesterConfig {
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let toml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&toml)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Registry from `license_file`, or the stock CKAN list when unset.
    pub fn license_registry(&self) -> Result<StaticLicenseRegistry, ConfigError> {
        match &self.license_file {
            Some(path) => Ok(StaticLicenseRegistry::load(path)?),
            None => Ok(StaticLicenseRegistry::ckan_defaults()),
        }
    }
}
