//! Single-instance coordination for the song manager desktop app.
//!
//! The first launch of the app becomes the **parent**: it owns a named,
//! system-visible endpoint and runs a listener thread that hands every
//! inbound payload to a [`MessageHandler`] and then pulls the main window to
//! the front. Every later launch becomes a **child**: it attaches to the same
//! endpoint, forwards its payload with [`InstanceCoordinator::send`] and is
//! expected to exit.
//!
//! Which process wins is decided by the operating system, not by this crate:
//! creating the endpoint is exclusive, so two launches racing each other can
//! never both become parent.
//!
//! # Platforms
//!
//! - Unix: a datagram socket in the user's runtime directory, guarded by an
//!   advisory lock file.
//! - Windows: a mailslot under `\\.\mailslot\`.

#[cfg(not(any(unix, windows)))]
compile_error!("instance-core supports Unix and Windows targets only");

pub mod config;
pub mod coordinator;
pub mod endpoint;
pub mod error;
pub mod handler;

#[cfg(windows)]
pub mod win32_window;

#[cfg(test)]
mod tests;

pub use config::InstanceConfig;
pub use coordinator::{CoordinatorState, InstanceCoordinator, Role};
pub use endpoint::EndpointName;
pub use handler::{HostWindow, Message, MessageHandler};

#[cfg(windows)]
pub use win32_window::Win32Window;

/// Identifier every cooperating process derives its endpoint name from.
pub const APP_IDENTIFIER: &str = "songmanager";

/// Endpoint name used when the configuration does not override it.
pub const DEFAULT_ENDPOINT_NAME: &str = const_format::concatcp!(APP_IDENTIFIER, "_instance_rpc");

/// Default receive capacity in bytes.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 4096;

/// Largest receive capacity the configuration accepts.
pub const MAX_MESSAGE_SIZE_LIMIT: usize = 64 * 1024;
