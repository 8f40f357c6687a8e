//! Test helpers.

use std::sync::Arc;

use checkout::{
    destination::Destination,
    discounts::Discount,
    money::Money,
    preview::CheckoutPreview,
    pricing::{PricedLine, PricingInput, price},
    rules::{FlatRateShipping, FlatRateTax},
};
use checkout_app::domain::{
    checkout::MockCheckoutService, ledger::IdempotencyKey, tenants::records::TenantUuid,
};
use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::iso::USD;
use salvo::{affix_state::inject, prelude::*};
use uuid::Uuid;

use crate::{extensions::*, state::State};

pub(crate) const TEST_TENANT_UUID: TenantUuid = TenantUuid::from_uuid(Uuid::nil());

#[salvo::handler]
pub(crate) async fn inject_tenant(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_tenant_uuid(TEST_TENANT_UUID);
    ctrl.call_next(req, depot, res).await;
}

pub(crate) fn state_with_checkout(checkout: MockCheckoutService) -> Arc<State> {
    Arc::new(State::new(Arc::new(checkout), [TEST_TENANT_UUID]))
}

pub(crate) fn checkout_service(checkout: MockCheckoutService, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(state_with_checkout(checkout)))
            .hoop(inject_tenant)
            .push(route),
    )
}

pub(crate) fn key(value: &str) -> IdempotencyKey {
    match IdempotencyKey::parse(value) {
        Ok(key) => key,
        Err(error) => unreachable!("test key {value:?} is invalid: {error}"),
    }
}

/// `V1 × 2` at 10.00 with `SAVE5`, 8% tax and 3.00 shipping: 19.20 USD.
pub(crate) fn sample_preview() -> CheckoutPreview {
    let usd = |minor| Money::from_minor(minor, USD);

    let priced = price(&PricingInput {
        currency: USD,
        lines: &[PricedLine {
            variant: "V1".into(),
            quantity: 2,
            unit_price: usd(10_00),
            weight_grams: 250,
        }],
        discounts: &[Discount::new("SAVE5", usd(5_00))],
        tax: &FlatRateTax::new(Percentage::from(Decimal::new(8, 2))),
        shipping: &FlatRateShipping::new(usd(3_00)),
        destination: &Destination::country("US"),
    });

    match priced {
        Ok(preview) => preview,
        Err(error) => unreachable!("sample preview failed to price: {error}"),
    }
}
