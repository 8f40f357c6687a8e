//! End-to-end checkout against the demo fixtures.

use std::{sync::Arc, time::Duration};

use checkout::{destination::Destination, discounts::DiscountCode, money::Money};
use checkout_app::{
    context::AppContext,
    domain::{
        checkout::{
            CartLine, CheckoutError, CheckoutRequest, CheckoutService, CheckoutSettings,
            spawn_reconciler,
        },
        ledger::{IdempotencyKey, IdempotencyLedger, LedgerState},
        orders::OrdersRepository,
        tenants::records::TenantUuid,
    },
    fixtures::Fixtures,
};
use jiff::Timestamp;
use rusty_money::iso::{JPY, USD};
use testresult::TestResult;

const FIXTURES: &str = include_str!("../../../fixtures/checkout.yml");

const DEMO_STORE: &str = "01964a4e-8b1c-7d2a-9f3e-2b7c4d5e6f70";
const TOKYO_OUTLET: &str = "01964a4e-8b1c-7d2a-9f3e-2b7c4d5e6f71";

async fn context(settings: CheckoutSettings) -> TestResult<AppContext> {
    let fixtures = Fixtures::from_yaml(FIXTURES)?;

    Ok(AppContext::from_fixtures(&fixtures, settings).await?)
}

fn cart(
    lines: &[(&str, u32)],
    codes: &[&str],
    destination: Destination,
    payment_ref: &str,
) -> CheckoutRequest {
    CheckoutRequest {
        lines: lines
            .iter()
            .map(|(variant, quantity)| CartLine::new(*variant, *quantity))
            .collect(),
        discount_codes: codes.iter().copied().map(DiscountCode::from).collect(),
        destination,
        payment_ref: payment_ref.to_string(),
    }
}

#[tokio::test]
async fn prices_against_destination_tax() -> TestResult {
    let ctx = context(CheckoutSettings::default()).await?;
    let tenant: TenantUuid = DEMO_STORE.parse()?;

    let new_york = ctx
        .checkout
        .preview(
            tenant,
            cart(&[("V1", 2)], &["SAVE5"], Destination::new("US", Some("NY"), None), ""),
        )
        .await?;

    assert_eq!(new_york.tax, Money::from_minor(1_20, USD));
    assert_eq!(new_york.shipping, Money::from_minor(3_00, USD));
    assert_eq!(new_york.total, Money::from_minor(19_20, USD));
    assert!(new_york.is_balanced());

    let oregon = ctx
        .checkout
        .preview(
            tenant,
            cart(&[("V3", 1)], &[], Destination::new("US", Some("OR"), None), ""),
        )
        .await?;

    assert_eq!(oregon.tax, Money::from_minor(0, USD));
    assert_eq!(oregon.shipping, Money::from_minor(0, USD));
    assert_eq!(oregon.total, Money::from_minor(125_00, USD));

    Ok(())
}

#[tokio::test]
async fn prices_zero_exponent_currency() -> TestResult {
    let ctx = context(CheckoutSettings::default()).await?;
    let tenant: TenantUuid = TOKYO_OUTLET.parse()?;

    let preview = ctx
        .checkout
        .preview(
            tenant,
            cart(&[("TEA", 2), ("POT", 1)], &["WELCOME"], Destination::country("JP"), ""),
        )
        .await?;

    assert_eq!(preview.subtotal, Money::from_minor(8460, JPY));
    assert_eq!(preview.tax, Money::from_minor(816, JPY));
    assert_eq!(preview.shipping, Money::from_minor(900, JPY));
    assert_eq!(preview.total, Money::from_minor(9876, JPY));
    assert_eq!(preview.currency, "JPY");

    Ok(())
}

#[tokio::test]
async fn tenants_do_not_share_catalogs() -> TestResult {
    let ctx = context(CheckoutSettings::default()).await?;
    let tenant: TenantUuid = TOKYO_OUTLET.parse()?;

    let result = ctx
        .checkout
        .preview(tenant, cart(&[("V1", 1)], &[], Destination::country("JP"), ""))
        .await;

    assert_eq!(result, Err(CheckoutError::UnknownVariant("V1".into())));

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_retries_commit_once() -> TestResult {
    let ctx = context(CheckoutSettings::default()).await?;
    let tenant: TenantUuid = DEMO_STORE.parse()?;
    let key = IdempotencyKey::parse("order-1")?;
    let checkout = Arc::clone(&ctx.checkout);

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let checkout = Arc::clone(&checkout);
            let key = key.clone();

            tokio::spawn(async move {
                checkout
                    .commit(
                        tenant,
                        key,
                        cart(&[("V1", 1)], &["SAVE5"], Destination::country("US"), "pay_1"),
                    )
                    .await
            })
        })
        .collect();

    let mut committed = Vec::new();

    for handle in handles {
        match handle.await? {
            Ok(receipt) => committed.push(receipt.order_uuid),
            Err(CheckoutError::InProgress) => {}
            Err(error) => return Err(error.into()),
        }
    }

    committed.dedup();

    assert_eq!(committed.len(), 1);
    assert_eq!(ctx.orders.created_since(Timestamp::MIN).await?.len(), 1);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn last_unit_goes_to_one_buyer() -> TestResult {
    let ctx = context(CheckoutSettings::default()).await?;
    let tenant: TenantUuid = DEMO_STORE.parse()?;

    let handles: Vec<_> = ["buyer-a", "buyer-b"]
        .into_iter()
        .map(|key| {
            let checkout = Arc::clone(&ctx.checkout);

            tokio::spawn(async move {
                checkout
                    .commit(
                        tenant,
                        IdempotencyKey::parse(key)?,
                        cart(&[("V2", 1)], &[], Destination::country("US"), key),
                    )
                    .await
            })
        })
        .collect();

    let mut committed = 0;
    let mut sold_out = 0;

    for handle in handles {
        match handle.await? {
            Ok(_) => committed += 1,
            Err(CheckoutError::InsufficientStock { .. }) => sold_out += 1,
            Err(error) => return Err(error.into()),
        }
    }

    assert_eq!((committed, sold_out), (1, 1));

    Ok(())
}

#[tokio::test]
async fn declined_payment_is_final() -> TestResult {
    let ctx = context(CheckoutSettings::default()).await?;
    let tenant: TenantUuid = DEMO_STORE.parse()?;
    let key = IdempotencyKey::parse("declined")?;
    let request = cart(&[("V1", 1)], &[], Destination::country("US"), "pay_declined");

    assert_eq!(
        ctx.checkout.commit(tenant, key.clone(), request.clone()).await,
        Err(CheckoutError::PaymentDeclined)
    );

    let replayed = ctx.checkout.commit(tenant, key.clone(), request).await;

    assert!(replayed.as_ref().is_err_and(CheckoutError::is_replayed));
    assert_eq!(replayed.map_err(CheckoutError::into_original), Err(CheckoutError::PaymentDeclined));

    assert!(ctx.orders.find_by_idempotency_key(tenant, &key).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn background_reconciler_resolves_abandoned_commits() -> TestResult {
    let ctx = context(CheckoutSettings {
        pending_timeout: Duration::ZERO,
        reconcile_interval: Duration::from_millis(20),
        ..CheckoutSettings::default()
    })
    .await?;
    let tenant: TenantUuid = DEMO_STORE.parse()?;
    let key = IdempotencyKey::parse("abandoned")?;
    let fingerprint = cart(&[("V1", 1)], &[], Destination::country("US"), "pay_1").fingerprint()?;

    ctx.ledger.begin_or_rejoin(tenant, &key, &fingerprint).await?;

    let reconciler = spawn_reconciler(ctx.reconciler());

    tokio::time::sleep(Duration::from_millis(200)).await;
    reconciler.abort();

    let record = ctx.ledger.find(tenant, &key).await?.ok_or("no ledger record")?;

    assert!(matches!(record.state, LedgerState::Completed { .. }));

    Ok(())
}
