use checkout_app::domain::checkout::CheckoutService;
use clap::Args;

use super::cart::{CartArgs, to_json};

#[derive(Debug, Args)]
pub(crate) struct PreviewArgs {
    #[command(flatten)]
    cart: CartArgs,
}

pub(crate) async fn run(args: PreviewArgs) -> Result<(), String> {
    let context = args.cart.context().await?;

    let preview = context
        .checkout
        .preview(args.cart.tenant, args.cart.request(""))
        .await
        .map_err(|error| format!("preview failed: {error}"))?;

    println!("{}", to_json(&preview)?);

    Ok(())
}
