//! Unified error types for the picture session.
//!
//! None of these are fatal. The session logs them and forwards a message to
//! the display sink; callers never receive them from navigation operations.

use std::fmt;
use std::path::PathBuf;

/// Session-specific errors.
#[derive(Debug)]
pub enum SessionError {
    /// Decoding a picture failed, or the file is not a picture at all
    DecodeFailure(String),
    /// A path the session relied on no longer exists
    PathVanished(PathBuf),
    /// Creating the watcher or subscribing a path failed
    WatchSubscription(String),
    /// Error scanning a directory for picture files
    DirectoryScan(String),
    /// The trash collaborator could not remove a file
    Trash(String),
    /// Settings could not be read or parsed
    Config(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::DecodeFailure(msg) => write!(f, "Cannot load picture: {}", msg),
            SessionError::PathVanished(path) => write!(f, "Path vanished: {}", path.display()),
            SessionError::WatchSubscription(msg) => write!(f, "Watch subscription failed: {}", msg),
            SessionError::DirectoryScan(msg) => write!(f, "Directory scan failed: {}", msg),
            SessionError::Trash(msg) => write!(f, "Move to trash failed: {}", msg),
            SessionError::Config(msg) => write!(f, "Invalid settings: {}", msg),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<image::ImageError> for SessionError {
    fn from(err: image::ImageError) -> Self {
        SessionError::DecodeFailure(err.to_string())
    }
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::DirectoryScan(err.to_string())
    }
}

impl From<notify::Error> for SessionError {
    fn from(err: notify::Error) -> Self {
        SessionError::WatchSubscription(err.to_string())
    }
}

impl From<toml::de::Error> for SessionError {
    fn from(err: toml::de::Error) -> Self {
        SessionError::Config(err.to_string())
    }
}

impl From<trash::Error> for SessionError {
    fn from(err: trash::Error) -> Self {
        SessionError::Trash(err.to_string())
    }
}

/// Type alias for Results in this crate.
pub type Result<T> = std::result::Result<T, SessionError>;
