//! Connection layer error types.

use thiserror::Error;

/// Errors surfaced by a [`KvConnection`](super::KvConnection) backend.
///
/// The record store never retries these; they propagate unchanged to the
/// caller, which owns the retry policy.
#[derive(Debug, Clone, Error)]
pub enum ConnectionError {
    /// An operation was issued against a key holding the wrong kind of
    /// value (a hash command on a set key, or vice versa).
    #[error("WRONGTYPE operation against key \"{key}\"")]
    WrongType { key: String },

    /// A backend answered a batch with replies that don't line up with the
    /// commands that were sent.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Transport-level failure reported by the backend.
    #[error("connection failure: {0}")]
    Backend(String),
}

/// result type alias for connection operations
pub type ConnResult<T> = Result<T, ConnectionError>;
