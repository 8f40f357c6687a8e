//! Checkout
//!
//! Prices carts and commits them into orders exactly once per idempotency key.

pub mod errors;
pub mod models;
pub mod reconciler;
pub mod service;

pub use errors::CheckoutError;
pub use models::{CartLine, CheckoutRequest, CheckoutSettings, CommitReceipt};
pub use reconciler::{ReconcileError, ReconcileReport, Reconciler, spawn_reconciler};
pub use service::*;
