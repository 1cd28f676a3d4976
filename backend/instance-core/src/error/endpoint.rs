use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum EndpointError {
    #[error("Invalid Endpoint Name Error: {message} {location}")]
    InvalidName {
        message: String,
        location: ErrorLocation,
    },
}
