pub mod config;
pub mod endpoint;
pub mod init;

pub use config::ConfigError;
pub use endpoint::EndpointError;
pub use init::InitError;
