//! Ledger errors.

use thiserror::Error;

/// Errors raised by ledger transitions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The key was first used with a different request.
    #[error("idempotency key reused with a different request")]
    FingerprintConflict,

    /// No record exists for the key.
    #[error("no ledger record for idempotency key")]
    NotFound,

    /// The record already holds a different terminal outcome.
    #[error("ledger record already completed with a different outcome")]
    OutcomeMismatch,
}

/// Reasons an idempotency key is rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdempotencyKeyError {
    /// No characters at all.
    #[error("idempotency key is empty")]
    Empty,

    /// Longer than the accepted maximum.
    #[error("idempotency key is longer than {max} characters")]
    TooLong {
        /// Longest accepted length.
        max: usize,
    },

    /// Whitespace, control or non-ASCII characters.
    #[error("idempotency key must be printable ASCII without spaces")]
    InvalidCharacter,
}
