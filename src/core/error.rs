//! Defines the custom error type for the `core` module.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for the `core` module.
///
/// Store corruption (`MalformedStore`) is always recovered where it occurs;
/// `OutsideBase` is always surfaced to the caller. Everything else is reported
/// per operation (or per item for batch operations).
#[derive(Debug, Error)]
pub enum CoreError {
    /// The path does not exist.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The target of a rename already exists.
    #[error("Path already exists: {0}")]
    AlreadyExists(PathBuf),

    /// A user supplied name failed validation.
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// The operating system refused access.
    #[error("Permission denied for path {0}")]
    PermissionDenied(PathBuf),

    /// Represents any other I/O error from file system operations.
    #[error("I/O error for path {1}: {0}")]
    Io(#[source] io::Error, PathBuf),

    /// The requested path resolves outside the configured base directory.
    #[error("Path is outside of the base directory: {0}")]
    OutsideBase(PathBuf),

    /// A persisted JSON store could not be parsed.
    #[error("Malformed store at {0}: {1}")]
    MalformedStore(PathBuf, #[source] serde_json::Error),

    /// Deleting the configured root itself is refused.
    #[error("Refusing to delete the root directory: {0}")]
    ProtectedRoot(PathBuf),

    /// Search criteria failed validation.
    #[error("Invalid search query: {0}")]
    InvalidQuery(String),

    /// Represents an error that occurred when a Tokio task was joined.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl CoreError {
    /// Maps an `io::Error` onto the dedicated variants where one exists.
    pub fn from_io(err: io::Error, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match err.kind() {
            io::ErrorKind::NotFound => CoreError::NotFound(path),
            io::ErrorKind::PermissionDenied => CoreError::PermissionDenied(path),
            io::ErrorKind::AlreadyExists => CoreError::AlreadyExists(path),
            _ => CoreError::Io(err, path),
        }
    }
}
