use checkout_app::domain::{checkout::CheckoutService, ledger::IdempotencyKey};
use clap::Args;
use uuid::Uuid;

use super::cart::{CartArgs, to_json};

#[derive(Debug, Args)]
pub(crate) struct CommitArgs {
    #[command(flatten)]
    cart: CartArgs,

    /// Payment authorisation reference
    #[arg(long)]
    payment_ref: String,

    /// Idempotency key; generated when omitted
    #[arg(long)]
    key: Option<String>,

    /// Submit the same commit this many times
    #[arg(long, default_value_t = 1)]
    attempts: u32,
}

pub(crate) async fn run(args: CommitArgs) -> Result<(), String> {
    let context = args.cart.context().await?;

    let key = IdempotencyKey::parse(
        &args
            .key
            .unwrap_or_else(|| Uuid::now_v7().to_string()),
    )
    .map_err(|error| format!("invalid idempotency key: {error}"))?;

    for _ in 0..args.attempts.max(1) {
        let receipt = context
            .checkout
            .commit(args.cart.tenant, key.clone(), args.cart.request(&args.payment_ref))
            .await
            .map_err(|error| format!("commit failed: {error}"))?;

        println!("{}", to_json(&receipt)?);
    }

    Ok(())
}
