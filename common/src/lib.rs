//! Shared building blocks for the song manager workspace.
//!
//! Everything that more than one crate needs but that carries no behaviour of
//! its own lives here. Right now that is only [`ErrorLocation`], which every
//! error enum in the workspace embeds so a rendered error always points at the
//! line that produced it.

pub mod error;

pub use error::error_location::ErrorLocation;

#[cfg(test)]
mod tests;
