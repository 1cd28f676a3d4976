//! Named, system-visible endpoint shared by every instance of the app.
//!
//! Each platform backend exposes the same crate-private surface:
//!
//! - `attach(&EndpointName) -> io::Result<Sender>` opens an existing endpoint
//!   for writing. It fails when no parent is alive.
//! - `create(&EndpointName, capacity) -> io::Result<Receiver>` creates the
//!   endpoint as its exclusive owner. When another process already owns it
//!   the error kind is one of [`is_contention`]'s kinds.
//! - `Receiver::close` may be called from any thread and unblocks a `recv`
//!   in progress.

#[cfg(unix)]
mod datagram;
#[cfg(windows)]
mod mailslot;

#[cfg(unix)]
pub(crate) use datagram::{Receiver, Sender, attach, create};
#[cfg(windows)]
pub(crate) use mailslot::{Receiver, Sender, attach, create};

use crate::DEFAULT_ENDPOINT_NAME;
use crate::error::EndpointError;

use common::ErrorLocation;

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::io::{Error as IoError, ErrorKind};
#[cfg(unix)]
use std::path::{Path, PathBuf};

/// Longest endpoint name accepted. Unix socket paths are capped at ~104 bytes
/// including the directory, so names stay short.
pub const MAX_ENDPOINT_NAME_LEN: usize = 64;

#[cfg(windows)]
const MAILSLOT_PREFIX: &str = r"\\.\mailslot\";

/// Validated endpoint identity, resolved to where it lives on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointName {
    name: String,
    #[cfg(unix)]
    directory: PathBuf,
}

impl EndpointName {
    /// Endpoint `name` in the platform's default location.
    #[track_caller]
    pub fn new(name: &str) -> Result<Self, EndpointError> {
        validate_name(name)?;
        Ok(Self {
            name: name.to_string(),
            #[cfg(unix)]
            directory: default_directory(),
        })
    }

    /// Endpoint `name` with its socket and lock file under `directory`.
    #[cfg(unix)]
    #[track_caller]
    pub fn in_dir(name: &str, directory: impl Into<PathBuf>) -> Result<Self, EndpointError> {
        validate_name(name)?;
        Ok(Self {
            name: name.to_string(),
            directory: directory.into(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    #[cfg(unix)]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    #[cfg(unix)]
    pub fn socket_path(&self) -> PathBuf {
        self.directory.join(format!("{}.sock", self.name))
    }

    #[cfg(unix)]
    pub fn lock_path(&self) -> PathBuf {
        self.directory.join(format!("{}.lock", self.name))
    }

    #[cfg(windows)]
    pub fn mailslot_path(&self) -> String {
        format!("{MAILSLOT_PREFIX}{}", self.name)
    }
}

impl Default for EndpointName {
    fn default() -> Self {
        Self {
            name: DEFAULT_ENDPOINT_NAME.to_string(),
            #[cfg(unix)]
            directory: default_directory(),
        }
    }
}

impl Display for EndpointName {
    #[cfg(unix)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(formatter, "{}", self.socket_path().display())
    }

    #[cfg(windows)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(formatter, "{}", self.mailslot_path())
    }
}

/// Checks that `name` is usable as an endpoint name on every platform.
///
/// Allowed: 1 to [`MAX_ENDPOINT_NAME_LEN`] ASCII alphanumerics, `_`, `-`, `.`,
/// not starting with `.`.
#[track_caller]
pub fn validate_name(name: &str) -> Result<(), EndpointError> {
    if name.is_empty() {
        return Err(EndpointError::InvalidName {
            message: "endpoint name cannot be empty".to_string(),
            location: ErrorLocation::caller(),
        });
    }

    if name.len() > MAX_ENDPOINT_NAME_LEN {
        return Err(EndpointError::InvalidName {
            message: format!(
                "endpoint name is {} characters (max {MAX_ENDPOINT_NAME_LEN})",
                name.len()
            ),
            location: ErrorLocation::caller(),
        });
    }

    if name.starts_with('.') {
        return Err(EndpointError::InvalidName {
            message: format!("endpoint name cannot start with '.': {name}"),
            location: ErrorLocation::caller(),
        });
    }

    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
    {
        return Err(EndpointError::InvalidName {
            message: format!("endpoint name contains invalid character {bad:?}: {name}"),
            location: ErrorLocation::caller(),
        });
    }

    Ok(())
}

/// Whether a `create` failure means another process owns the endpoint.
pub(crate) fn is_contention(error: &IoError) -> bool {
    matches!(
        error.kind(),
        ErrorKind::WouldBlock | ErrorKind::AddrInUse | ErrorKind::AlreadyExists
    )
}

#[cfg(unix)]
fn default_directory() -> PathBuf {
    dirs::runtime_dir().unwrap_or_else(std::env::temp_dir)
}
