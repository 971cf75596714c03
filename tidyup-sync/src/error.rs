//! Error types for tidyup-sync.

use thiserror::Error;

use tidyup_core::CoreError;

/// Failures talking to a remote store.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Connection, DNS, TLS or other transport failure.
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The server answered with an unexpected status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The body could not be decoded as the expected JSON document.
    #[error("malformed response from {url}: {message}")]
    Decode { url: String, message: String },

    /// The join code does not resolve to a household.
    #[error("invalid join code")]
    InvalidJoinCode,

    /// The store is deliberately refusing requests (in-memory store only).
    #[error("remote store unavailable")]
    Unavailable,

    /// The blocking request task panicked or was cancelled.
    #[error("remote request task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Errors surfaced by [`crate::Session`] operations.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("remote store error: {0}")]
    Remote(#[from] RemoteError),

    /// Join rejected; local state is untouched.
    #[error("invalid join code {code:?}")]
    InvalidJoinCode { code: String },
}
