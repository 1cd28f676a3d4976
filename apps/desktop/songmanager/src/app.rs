//! Startup policy: become the single running window, or hand our payload to it.
//!
//! | `initialize` result | What the process does                                   |
//! |---------------------|---------------------------------------------------------|
//! | `Child`             | send the payload and exit; on a failed send, take over  |
//! | `Parent`            | open the payload, print forwarded payloads until `quit` |
//! | error               | run standalone without forwarding                       |

use crate::cli::Cli;
use crate::error::SongManagerError;
use crate::logger;
use crate::window::ConsoleWindow;

use instance_core::{HostWindow, InstanceConfig, InstanceCoordinator, Message, Role};

use common::ErrorLocation;

use std::fs::create_dir_all;
use std::io::{BufRead, stdin};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use log::{error, info, warn};

/// Line on stdin that shuts the parent down.
pub const QUIT_COMMAND: &str = "quit";

/// Title the console window logs under.
pub const WINDOW_TITLE: &str = "Song Manager";

/// How the process ended up running after startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Payload delivered to the running instance; this process is done.
    Forwarded,
    /// This process owns the endpoint and receives later launches.
    Parent,
    /// Single-instance setup failed; running without forwarding.
    Standalone,
}

/// Runs the app to completion.
pub fn run(cli: &Cli) -> Result<ExitCode, SongManagerError> {
    let level = cli.log_level_filter()?;
    let log_dir = log_dir()?;
    create_dir_all(&log_dir).map_err(|e| SongManagerError::SongManager {
        message: format!("Failed to create log directory: {e}"),
        location: ErrorLocation::caller(),
    })?;
    logger::initialize(&log_dir, level)?;

    info!("Song manager starting");
    info!("Log directory: {}", log_dir.display());

    let config = resolve_config(cli)?;
    let mut coordinator =
        InstanceCoordinator::from_config(&config).map_err(|e| SongManagerError::Core {
            message: format!("Invalid endpoint: {e}"),
            location: ErrorLocation::caller(),
        })?;
    let window: Arc<dyn HostWindow> = Arc::new(ConsoleWindow::new(WINDOW_TITLE));
    let payload = cli.payload_bytes();

    match start(&mut coordinator, &config, &payload, window) {
        Outcome::Forwarded => {}
        outcome => {
            open_payload(&payload);
            wait_for_quit(stdin().lock());
            info!("Shutting down ({outcome:?})");
        }
    }

    coordinator.terminate();
    Ok(ExitCode::SUCCESS)
}

/// Decides this process's role and forwards `payload` when a parent exists.
///
/// A child whose send fails assumes the parent is gone, releases its
/// endpoint and initializes once more, which normally makes it the parent.
pub fn start(
    coordinator: &mut InstanceCoordinator,
    config: &InstanceConfig,
    payload: &[u8],
    window: Arc<dyn HostWindow>,
) -> Outcome {
    match coordinator.initialize(print_message, config.max_message_size, Some(Arc::clone(&window))) {
        Ok(Role::Parent) => return Outcome::Parent,
        Ok(Role::Child) => {
            if coordinator.send(payload) {
                info!("Forwarded {} bytes to the running instance", payload.len());
                return Outcome::Forwarded;
            }
            warn!("Running instance did not accept the payload; taking over");
            coordinator.terminate();
        }
        Err(e) => {
            warn!("Single-instance setup failed, running standalone: {e}");
            return Outcome::Standalone;
        }
    }

    match coordinator.initialize(print_message, config.max_message_size, Some(window)) {
        Ok(Role::Parent) => Outcome::Parent,
        Ok(Role::Child) => {
            warn!("Another instance took over first; running standalone");
            coordinator.terminate();
            Outcome::Standalone
        }
        Err(e) => {
            error!("Failed to take over as the running instance: {e}");
            Outcome::Standalone
        }
    }
}

/// Config file plus command line overrides, validated together.
pub fn resolve_config(cli: &Cli) -> Result<InstanceConfig, SongManagerError> {
    let config_dir = match &cli.config {
        Some(dir) => dir.clone(),
        None => InstanceConfig::default_dir().map_err(|e| SongManagerError::Config {
            message: e.to_string(),
            location: ErrorLocation::caller(),
        })?,
    };

    let mut config = InstanceConfig::load(&config_dir).map_err(|e| SongManagerError::Config {
        message: e.to_string(),
        location: ErrorLocation::caller(),
    })?;

    if let Some(endpoint) = &cli.endpoint {
        config.endpoint_name = endpoint.clone();
    }
    if let Some(max_message_size) = cli.max_message_size {
        config.max_message_size = max_message_size;
    }

    config.validate().map_err(|e| SongManagerError::Config {
        message: e.to_string(),
        location: ErrorLocation::caller(),
    })?;

    Ok(config)
}

/// Blocks until `input` reaches EOF or a `quit` line.
pub fn wait_for_quit(input: impl BufRead) {
    for line in input.lines() {
        match line {
            Ok(line) if line.trim() == QUIT_COMMAND => return,
            Ok(_) => {}
            Err(e) => {
                warn!("Stopped reading stdin: {e}");
                return;
            }
        }
    }
}

fn print_message(message: Message<'_>) {
    open_payload(message.as_bytes());
}

fn open_payload(payload: &[u8]) {
    if !payload.is_empty() {
        println!("open: {}", String::from_utf8_lossy(payload));
    }
}

fn log_dir() -> Result<PathBuf, SongManagerError> {
    dirs::data_local_dir()
        .map(|dir| dir.join(instance_core::APP_IDENTIFIER).join("logs"))
        .ok_or_else(|| SongManagerError::SongManager {
            message: "No local data directory for logs".to_string(),
            location: ErrorLocation::caller(),
        })
}
