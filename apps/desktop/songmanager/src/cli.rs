//! Command line for the song manager.

use crate::error::SongManagerError;
use crate::logger::DEFAULT_LOG_LEVEL;

use common::ErrorLocation;

use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use log::LevelFilter;

/// Song manager: opens songs, forwarding them to the running window if there is one
#[derive(Debug, Parser)]
#[command(name = "songmanager", version)]
pub struct Cli {
    /// Directory holding config.json
    #[arg(short, long, value_name = "DIR")]
    pub config: Option<PathBuf>,

    /// Endpoint name overriding the config file
    #[arg(short, long, value_name = "NAME")]
    pub endpoint: Option<String>,

    /// Receive capacity in bytes overriding the config file (parent only)
    #[arg(short, long, value_name = "BYTES")]
    pub max_message_size: Option<usize>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR, OFF)
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// What to open, usually file paths. Forwarded to the running instance as one message.
    #[arg(value_name = "PAYLOAD")]
    pub payload: Vec<String>,
}

impl Cli {
    /// Payload words joined by single spaces.
    pub fn payload_bytes(&self) -> Vec<u8> {
        self.payload.join(" ").into_bytes()
    }

    /// The requested log level, or the build's default.
    #[track_caller]
    pub fn log_level_filter(&self) -> Result<LevelFilter, SongManagerError> {
        match &self.log_level {
            None => Ok(DEFAULT_LOG_LEVEL),
            Some(level) => LevelFilter::from_str(level).map_err(|e| SongManagerError::Config {
                message: format!("Invalid log level '{level}': {e}"),
                location: ErrorLocation::caller(),
            }),
        }
    }
}
