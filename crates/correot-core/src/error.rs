//! Error types for correlated OT setup

use crate::oblivious::RandomOtError;
use thiserror::Error;

/// Result type alias for correlated OT operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running the correlated OT setup handshake
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid setup or session configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The peer's base OT setup message was malformed or failed verification
    #[error("Base OT setup verification failed: {0}")]
    SetupVerification(#[source] RandomOtError),

    /// A single base OT instance failed; the whole round is aborted
    #[error("Base OT instance {index} failed: {source}")]
    IndexProtocol {
        index: usize,
        #[source]
        source: RandomOtError,
    },

    /// Incoming round message does not carry one entry per base OT
    #[error("Length mismatch: expected {expected} entries, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Timeout waiting for message
    #[error("Timeout waiting for {0}")]
    Timeout(String),
}

impl Error {
    pub(crate) fn at_index(index: usize) -> impl FnOnce(RandomOtError) -> Self {
        move |source| Error::IndexProtocol { index, source }
    }
}
