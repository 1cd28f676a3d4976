use crate::endpoint::{self, EndpointName};
use crate::error::{ConfigError, EndpointError};
use crate::{APP_IDENTIFIER, DEFAULT_ENDPOINT_NAME, DEFAULT_MAX_MESSAGE_SIZE, MAX_MESSAGE_SIZE_LIMIT};

use common::ErrorLocation;

use std::fs::{create_dir_all, read_to_string, rename, write};
use std::io::{Error as IoError, ErrorKind};
use std::path::{Path, PathBuf};

use const_format::concatcp;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_VERSION: u32 = 1;

// ============================================
// CONFIG STRUCT
// ============================================

/// Settings every cooperating process must agree on.
///
/// Parent and children read the same file, so they resolve the same endpoint.
/// `max_message_size` only matters to the parent, which fixes the capacity
/// when it creates the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_endpoint_name")]
    pub endpoint_name: String,

    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            endpoint_name: default_endpoint_name(),
            max_message_size: default_max_message_size(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_endpoint_name() -> String {
    DEFAULT_ENDPOINT_NAME.to_string()
}
fn default_max_message_size() -> usize {
    DEFAULT_MAX_MESSAGE_SIZE
}

// ============================================
// IMPLEMENTATION
// ============================================

impl InstanceConfig {
    /// `{config_dir}/songmanager`, where the app keeps `config.json`.
    #[track_caller]
    pub fn default_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_IDENTIFIER))
            .ok_or_else(|| ConfigError::NoConfigDir {
                location: ErrorLocation::caller(),
            })
    }

    /// Reads `config.json` from `config_dir`.
    ///
    /// A missing file is the first launch on this machine and yields the
    /// defaults. A file that exists but cannot be read, parsed or validated
    /// is an error.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = config_dir.join(CONFIG_FILE_NAME);

        let contents = match read_to_string(&path) {
            Ok(contents) => contents,
            Err(source) if source.kind() == ErrorKind::NotFound => {
                info!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                warn!("Cannot read {}: {source}", path.display());
                return Err(ConfigError::Read {
                    path,
                    location: ErrorLocation::caller(),
                    source,
                });
            }
        };

        let config: InstanceConfig = match serde_json::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                warn!("Cannot parse {}: {e}", path.display());
                return Err(ConfigError::Parse {
                    path,
                    message: e.to_string(),
                    location: ErrorLocation::caller(),
                });
            }
        };
        config.validate()?;

        debug!("Loaded {config:?} from {}", path.display());
        Ok(config)
    }

    /// Writes `config.json` into `config_dir`, creating the directory.
    ///
    /// The file is written next to its destination and renamed over it, so a
    /// launcher reading concurrently sees the old or the new file, never half.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        let path = config_dir.join(CONFIG_FILE_NAME);
        let staging = config_dir.join(concatcp!(CONFIG_FILE_NAME, ".tmp"));
        let write_error = |path: &Path, source: IoError| ConfigError::Write {
            path: path.to_path_buf(),
            location: ErrorLocation::caller(),
            source,
        };

        create_dir_all(config_dir).map_err(|e| write_error(config_dir, e))?;
        let json = serde_json::to_vec_pretty(self).map_err(|e| write_error(&path, e.into()))?;
        write(&staging, json).map_err(|e| write_error(&staging, e))?;
        rename(&staging, &path).map_err(|e| write_error(&path, e))?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Checks version, capacity range and endpoint name.
    #[track_caller]
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::Invalid {
            message,
            location: ErrorLocation::caller(),
        };

        if !(1..=CONFIG_VERSION).contains(&self.version) {
            return Err(invalid(format!(
                "version {} is not supported (1-{CONFIG_VERSION})",
                self.version
            )));
        }

        if !(1..=MAX_MESSAGE_SIZE_LIMIT).contains(&self.max_message_size) {
            return Err(invalid(format!(
                "max_message_size {} is outside 1-{MAX_MESSAGE_SIZE_LIMIT}",
                self.max_message_size
            )));
        }

        endpoint::validate_name(&self.endpoint_name).map_err(|e| invalid(e.to_string()))
    }

    /// The endpoint this config names, in the platform's default location.
    #[track_caller]
    pub fn endpoint(&self) -> Result<EndpointName, EndpointError> {
        EndpointName::new(&self.endpoint_name)
    }
}
