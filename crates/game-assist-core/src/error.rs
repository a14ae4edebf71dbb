//! Error types for game-assist-core

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for game-assist operations
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed credential. Raised before any network traffic.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Transport(String),

    /// Non-2xx response; `body` is the provider's diagnostic text, verbatim.
    #[error("API request failed: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse API response: {0}")]
    Parse(String),

    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("Failed to save session files to {path}: {message}")]
    Persistence { path: PathBuf, message: String },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` for errors that never reached the network.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Parse(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Result type alias for game-assist operations
pub type Result<T> = std::result::Result<T, Error>;
