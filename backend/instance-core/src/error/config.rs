use common::ErrorLocation;

use std::io::Error as IoError;
use std::path::PathBuf;

use thiserror::Error as ThisError;

/// Why `config.json` could not be used.
///
/// A broken file is an error rather than a silent fallback to defaults: parent
/// and children must agree on the endpoint, and a launcher that quietly picked
/// the default name could become a second parent.
#[derive(Debug, ThisError)]
pub enum ConfigError {
    /// The platform has no per-user config directory.
    #[error("No Config Dir Error: {location}")]
    NoConfigDir { location: ErrorLocation },

    #[error("Config Read Error: cannot read {} {location}", path.display())]
    Read {
        path: PathBuf,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    /// The file exists but is not a JSON `InstanceConfig`.
    #[error("Config Parse Error: {} is not valid: {message} {location}", path.display())]
    Parse {
        path: PathBuf,
        message: String,
        location: ErrorLocation,
    },

    /// Serializing, writing the temp file or renaming it over the old one failed.
    #[error("Config Write Error: cannot write {} {location}", path.display())]
    Write {
        path: PathBuf,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error("Invalid Config Error: {message} {location}")]
    Invalid {
        message: String,
        location: ErrorLocation,
    },
}
