use common::ErrorLocation;

use serde::Serialize;
use thiserror::Error;

/// Errors that stop the song manager before it can run.
///
/// Coordinator failures are not in here: when single-instance setup fails the
/// app logs it and carries on standalone.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum SongManagerError {
    /// Error from this App
    #[error("SongManager Error: {message} {location}")]
    SongManager {
        message: String,
        location: ErrorLocation,
    },

    /// Error from instance-core operations (endpoint naming, coordinator setup)
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },

    /// Config file could not be loaded or an override is invalid
    #[error("Config Error: {message} {location}")]
    Config {
        message: String,
        location: ErrorLocation,
    },
}
