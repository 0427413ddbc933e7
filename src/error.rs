//! Error handling types for semantic-tokens-wire
//!
//! This module provides error types used by the codec, the token store and the adapters.

use std::sync::PoisonError;
use thiserror::Error;

/// Errors raised while decoding a snapshot byte buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Byte length is not a whole number of 32-bit words
    #[error("buffer of {len} bytes is not a whole number of 32-bit words")]
    Misaligned { len: usize },

    /// A header or a length-prefixed run extends past the end of the buffer
    #[error("buffer truncated: needed {needed} words, {available} available")]
    Truncated { needed: usize, available: usize },

    /// Type tag is neither Full (1) nor Delta (2)
    #[error("unknown snapshot type tag: {tag}")]
    UnknownSnapshotType { tag: u32 },

    /// Full token data is not a whole number of token tuples
    #[error("full token data of {len} words is not a multiple of 5")]
    InvalidTokenData { len: usize },

    /// Words left over after a complete snapshot
    #[error("{count} trailing words after snapshot")]
    TrailingWords { count: usize },
}

/// Errors raised while applying edits to a token array.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// Edit range falls outside the base array
    #[error("edit {start}+{delete_count} exceeds base length {base_len}")]
    OutOfBounds {
        start: u32,
        delete_count: u32,
        base_len: usize,
    },

    /// Two edits touch the same region of the base array
    #[error("edit at {start} overlaps the previous edit ending at {previous_end}")]
    Overlapping { start: u32, previous_end: usize },

    /// A delta arrived before any full snapshot
    #[error("delta received without a full snapshot to apply it to")]
    MissingBase,

    /// Resulting array is not a whole number of token tuples
    #[error("resulting token data of {len} words is not a multiple of 5")]
    InvalidTokenData { len: usize },
}

/// Comprehensive error type for semantic token operations
#[derive(Debug, Error)]
pub enum SemanticTokensError {
    /// Malformed snapshot buffer
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Edits could not be applied
    #[error("Apply error: {0}")]
    Apply(#[from] ApplyError),

    /// A collaborator returned something its contract rules out
    #[error("Contract violation: {message}")]
    ContractViolation { message: String },

    /// Configuration error
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for semantic token operations
pub type SemanticTokensResult<T> = Result<T, SemanticTokensError>;

impl SemanticTokensError {
    /// Create a contract violation error
    pub fn contract_violation(message: impl Into<String>) -> Self {
        SemanticTokensError::ContractViolation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        SemanticTokensError::Config {
            message: message.into(),
        }
    }
}

/// Helper trait to recover from poisoned `std::sync::Mutex` guards.
pub trait LockResultExt<T> {
    /// Recover the guard from a poisoned lock, logging which operation hit it.
    fn recover_poison(self, context: &str) -> T;
}

impl<T> LockResultExt<T> for Result<T, PoisonError<T>> {
    fn recover_poison(self, context: &str) -> T {
        match self {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!(
                    target: "semantic_tokens_wire::lock_recovery",
                    "Recovered from poisoned lock in {}",
                    context
                );
                poisoned.into_inner()
            }
        }
    }
}
