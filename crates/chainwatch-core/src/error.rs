//! Error types for the chainwatch pipeline.

use thiserror::Error;

/// Errors raised by a [`ChainClient`](crate::ChainClient).
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Response id {got} does not match request id {expected}")]
    IdMismatch { expected: u64, got: String },

    #[error("Block {number} is not available yet")]
    BlockUnavailable { number: u64 },
}

impl ClientError {
    /// Returns `true` if retrying the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Http(_) | Self::BlockUnavailable { .. }
        )
    }
}

/// Errors surfaced by the coordinator, repositories and read side.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Chain client error: {0}")]
    Client(#[from] ClientError),

    #[error("Subscriber not found: {address}")]
    SubscriberNotFound { address: String },

    #[error("Block not found")]
    BlockNotFound,

    #[error("No block for parsing: chain head {head} is already claimed")]
    NoBlockForParsing { head: u64 },

    #[error("Unknown block status")]
    UnknownBlockStatus,

    #[error("Invalid address: {0:?}")]
    InvalidAddress(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl WatchError {
    /// Returns `true` for "nothing there" outcomes that callers treat as data.
    pub fn is_absence(&self) -> bool {
        matches!(self, Self::SubscriberNotFound { .. } | Self::BlockNotFound)
    }

    /// Returns `true` when a worker is caught up with the chain head.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::NoBlockForParsing { .. })
    }

    /// Returns `true` if the next scheduled run may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Client(e) => e.is_retryable(),
            Self::Storage(_) | Self::NoBlockForParsing { .. } => true,
            _ => false,
        }
    }
}
