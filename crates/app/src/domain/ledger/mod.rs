//! Idempotency Ledger
//!
//! Records, per tenant and idempotency key, the fingerprint of the first
//! accepted commit request and its eventual outcome. The ledger is the
//! authority on whether a commit has happened.

pub mod errors;
pub mod models;
pub mod service;

pub use errors::{IdempotencyKeyError, LedgerError};
pub use models::{Begin, FailureKind, IdempotencyKey, IdempotencyRecord, LedgerState, Outcome};
pub use service::*;
