//! Error types for Omniverse Core.

use omniverse_abstraction::ModelError;
use thiserror::Error;

use crate::config::ConfigError;

/// Core error type for Omniverse operations.
#[derive(Error, Debug)]
pub enum OmniverseError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Address parsing errors
    #[error("Invalid address: {0}")]
    InvalidAddress(#[from] std::net::AddrParseError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Model-related errors
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Tree (de)serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Relay errors
    #[error("Relay error: {0}")]
    Relay(String),
}

/// Result type alias for Omniverse operations.
pub type Result<T> = std::result::Result<T, OmniverseError>;
