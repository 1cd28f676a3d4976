//! Log output for the song manager.
//!
//! Every launch logs, including children that only forward a payload and
//! exit, so all of them append to the same `songmanager.log`. Each file line
//! carries the thread name, which tells the listener thread's delivery
//! records apart from the main thread's startup records.

use crate::error::SongManagerError;

use common::ErrorLocation;

use std::fmt::Arguments;
use std::io::stdout;
use std::path::Path;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::SystemTime;

use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use fern::{Dispatch, FormatCallback};
use humantime::format_rfc3339;
use log::{LevelFilter, Record, info, warn};

static INSTALL: Once = Once::new();
static INSTALL_ATTEMPTED: AtomicBool = AtomicBool::new(false);

/// Shared by every launch; opened in append mode.
pub const LOG_FILE_NAME: &str = "songmanager.log";

#[cfg(debug_assertions)]
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Debug;

#[cfg(not(debug_assertions))]
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Installs the global logger: colored records on stdout, plain records in
/// `log_dir/songmanager.log`.
///
/// Only the first call installs anything. Later calls, for example when a
/// child takes over as parent and runs startup again, log a warning, keep the
/// first `level` and return `Ok`.
///
/// # Errors
///
/// [`SongManagerError::SongManager`] when the log file cannot be opened or a
/// logger is already installed by someone else.
pub fn initialize(log_dir: &Path, level: LevelFilter) -> Result<(), SongManagerError> {
    if INSTALL_ATTEMPTED.swap(true, Ordering::SeqCst) {
        warn!("Logger already installed; keeping the first configuration");
        return Ok(());
    }

    let mut result = Ok(());
    INSTALL.call_once(|| {
        result = install(log_dir, level);
        if result.is_ok() {
            info!("Logging at {level:?} to {}", log_dir.join(LOG_FILE_NAME).display());
        }
    });

    result
}

#[track_caller]
fn install(log_dir: &Path, level: LevelFilter) -> Result<(), SongManagerError> {
    let colors = ColoredLevelConfig::new()
        .trace(Magenta)
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red);

    let log_file = fern::log_file(log_dir.join(LOG_FILE_NAME)).map_err(|e| {
        SongManagerError::SongManager {
            message: format!("Cannot open {LOG_FILE_NAME} in {}: {e}", log_dir.display()),
            location: ErrorLocation::caller(),
        }
    })?;

    let console = Dispatch::new()
        .format(move |out, message, record| {
            write_record(out, colors.color(record.level()), message, record)
        })
        .chain(stdout());

    let file = Dispatch::new()
        .format(|out, message, record| {
            let thread = thread::current();
            let name = thread.name().unwrap_or("unnamed");
            write_record(out, record.level(), &format_args!("{name} {message}"), record)
        })
        .chain(log_file);

    Dispatch::new()
        .level(level)
        .chain(console)
        .chain(file)
        .apply()
        .map_err(|e| SongManagerError::SongManager {
            message: format!("Another logger is already installed: {e}"),
            location: ErrorLocation::caller(),
        })
}

/// `[<rfc3339> - <level>] <message> [<file>:<line>]`
fn write_record(
    out: FormatCallback<'_>,
    level: impl std::fmt::Display,
    message: &Arguments<'_>,
    record: &Record<'_>,
) {
    out.finish(format_args!(
        "[{} - {level}] {message} [{}:{}]",
        format_rfc3339(SystemTime::now()),
        record.file().unwrap_or("unknown"),
        record.line().unwrap_or(0),
    ))
}
