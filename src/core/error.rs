//! Defines the custom error type for the `core` module.

use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for search, transport, and dialog operations.
///
/// Every variant is surfaced to the user as a dismissible notice; none of
/// them tear down the session. The orchestrator's settle path restores an
/// interactive UI no matter which variant occurred.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Local pre-dispatch validation failure. Never reaches the search service.
    #[error("{0}")]
    Validation(String),

    /// A request/response operation failed with a server-supplied message.
    #[error("{0}")]
    Request(String),

    /// Transport-level failure of an open stream, as opposed to an in-band
    /// error payload (which is `Backend`).
    #[error("Connection error occurred. Please try again.")]
    Stream,

    /// An application-level `{error}` payload received on the stream.
    #[error("{0}")]
    Backend(String),

    /// The backend rejected a cancel-by-id request.
    #[error("Failed to cancel search")]
    Cancel,

    /// The native dialog collaborator failed (distinct from user-cancel,
    /// which is reported as `None` rather than an error).
    #[error("Failed to open folder selection dialog")]
    Dialog,

    /// A request to open a file with the system default application failed.
    #[error("Failed to open file: {0}")]
    Open(String),

    /// Represents an I/O error, typically from file system operations.
    #[error("I/O error for path {1}: {0}")]
    Io(#[source] std::io::Error, PathBuf),

    /// Represents an error that occurred when a Tokio task was joined.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}
