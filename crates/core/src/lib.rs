//! Checkout
//!
//! Exact money arithmetic and a deterministic pricing engine for turning a cart
//! into a priced checkout preview.

pub mod destination;
pub mod discounts;
pub mod fingerprint;
pub mod items;
pub mod money;
pub mod prelude;
pub mod preview;
pub mod pricing;
pub mod rules;
