//! Error types for aircast
//!
//! Defines service-wide error types using thiserror for clear error propagation.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for aircast
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Playlist directory is missing
    #[error("Playlist directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// No playable tracks in the station's playlist
    #[error("Station '{0}' has an empty playlist")]
    EmptyPlaylist(String),

    /// Station id already registered
    #[error("Station '{0}' already exists")]
    DuplicateStation(String),

    /// No station registered under this id
    #[error("Station '{0}' not found")]
    StationNotFound(String),

    /// Station has been stopped and accepts no further commands
    #[error("Station '{0}' is stopped")]
    StationStopped(String),

    /// Broadcast pipeline construction or command errors
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// Telegram Bot API errors
    #[error("Telegram error: {0}")]
    Telegram(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using aircast Error
pub type Result<T> = std::result::Result<T, Error>;
