//! Test Helpers

use checkout::{destination::Destination, discounts::DiscountCode};

use crate::domain::{
    checkout::{CartLine, CheckoutRequest},
    ledger::IdempotencyKey,
};

pub(crate) fn request(lines: &[(&str, u32)], codes: &[&str], payment_ref: &str) -> CheckoutRequest {
    CheckoutRequest {
        lines: lines
            .iter()
            .map(|(variant, quantity)| CartLine::new(*variant, *quantity))
            .collect(),
        discount_codes: codes.iter().copied().map(DiscountCode::from).collect(),
        destination: Destination::country("US"),
        payment_ref: payment_ref.to_string(),
    }
}

pub(crate) fn key(value: &str) -> IdempotencyKey {
    match IdempotencyKey::parse(value) {
        Ok(key) => key,
        Err(error) => unreachable!("test key {value:?} is invalid: {error}"),
    }
}
