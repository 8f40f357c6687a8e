//! Checkout Domain Concerns

pub mod catalog;
pub mod checkout;
pub mod discounts;
pub mod ledger;
pub mod orders;
pub mod reservations;
pub mod rules;
pub mod tenants;
