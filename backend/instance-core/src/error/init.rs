use common::ErrorLocation;

use std::io::Error as IoError;

use thiserror::Error as ThisError;

/// Reasons [`InstanceCoordinator::initialize`](crate::InstanceCoordinator::initialize) can fail.
///
/// Every variant leaves the coordinator fully cleaned up; the caller is free
/// to carry on as a standalone instance.
#[derive(Debug, ThisError)]
pub enum InitError {
    #[error("Already Initialized Error: {message} {location}")]
    AlreadyInitialized {
        message: String,
        location: ErrorLocation,
    },

    /// Another process created the endpoint between our attach and create.
    #[error("Contention Error: {message} {location}")]
    Contention {
        message: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error("Allocation Error: {message} {location}")]
    AllocationFailed {
        message: String,
        location: ErrorLocation,
    },

    #[error("Invalid Capacity Error: {message} {location}")]
    InvalidCapacity {
        message: String,
        location: ErrorLocation,
    },

    #[error("Endpoint Error: {message} {location}")]
    Endpoint {
        message: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error("Listener Spawn Error: {message} {location}")]
    ListenerSpawn {
        message: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },
}
