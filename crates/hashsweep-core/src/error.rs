//! Error types for hashsweep.

use thiserror::Error;

/// Result type alias for hashsweep operations.
pub type Result<T> = std::result::Result<T, HashsweepError>;

/// Errors that can occur while configuring or running a search.
///
/// A search that exhausts its space without a match is not an error; it
/// yields an outcome with `found == false`.
#[derive(Error, Debug)]
pub enum HashsweepError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unknown hash function name
    #[error("Unknown hash function: {0} (expected MD5, SHA-512 or shadow)")]
    UnknownScheme(String),

    /// Target digest could not be decoded for the selected scheme
    #[error("Invalid target digest: {0}")]
    InvalidTarget(String),

    /// A send, receive or collective in the message-passing layer failed
    #[error("Communication error: {0}")]
    Communication(String),

    /// A worker thread terminated abnormally
    #[error("Worker {0} panicked")]
    WorkerPanicked(usize),

    /// Another worker failed and aborted the cluster
    #[error("Search aborted: worker {0} failed")]
    PeerAborted(usize),
}
