use std::path::PathBuf;

use checkout::{destination::Destination, discounts::DiscountCode};
use checkout_app::{
    context::AppContext,
    domain::{
        checkout::{CartLine, CheckoutRequest, CheckoutSettings},
        tenants::records::TenantUuid,
    },
    fixtures::Fixtures,
};
use clap::Args;

/// Cart and store options shared by the pricing commands.
#[derive(Debug, Args)]
pub(crate) struct CartArgs {
    /// YAML fixture file describing tenants, catalog and rules
    #[arg(long, env = "CHECKOUT_FIXTURE")]
    pub fixture: PathBuf,

    /// Tenant to price for
    #[arg(long)]
    pub tenant: TenantUuid,

    /// Cart line as VARIANT=QUANTITY; repeatable
    #[arg(long = "item", value_parser = parse_line, required = true)]
    pub lines: Vec<CartLine>,

    /// Discount code; repeatable, applied in order
    #[arg(long = "discount")]
    pub discounts: Vec<String>,

    /// Destination country code
    #[arg(long, default_value = "US")]
    pub country: String,

    /// Destination region code
    #[arg(long)]
    pub region: Option<String>,

    /// Destination postal code
    #[arg(long)]
    pub postal_code: Option<String>,
}

impl CartArgs {
    pub(crate) fn request(&self, payment_ref: &str) -> CheckoutRequest {
        CheckoutRequest {
            lines: self.lines.clone(),
            discount_codes: self
                .discounts
                .iter()
                .map(|code| DiscountCode::from(code.as_str()))
                .collect(),
            destination: Destination::new(
                &self.country,
                self.region.as_deref(),
                self.postal_code.as_deref(),
            ),
            payment_ref: payment_ref.to_string(),
        }
    }

    pub(crate) async fn context(&self) -> Result<AppContext, String> {
        let fixtures = Fixtures::load(&self.fixture)
            .map_err(|error| format!("failed to load {}: {error}", self.fixture.display()))?;

        AppContext::from_fixtures(&fixtures, CheckoutSettings::default())
            .await
            .map_err(|error| format!("failed to build store: {error}"))
    }
}

fn parse_line(value: &str) -> Result<CartLine, String> {
    let (variant, quantity) = value
        .split_once('=')
        .ok_or_else(|| format!("expected VARIANT=QUANTITY, got {value:?}"))?;

    let quantity = quantity
        .trim()
        .parse::<u32>()
        .map_err(|error| format!("invalid quantity in {value:?}: {error}"))?;

    Ok(CartLine::new(variant.trim(), quantity))
}

pub(crate) fn to_json(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|error| format!("failed to encode output: {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_variant_and_quantity() {
        assert_eq!(parse_line(" V1 = 2"), Ok(CartLine::new("V1", 2)));
        assert!(parse_line("V1").is_err());
        assert!(parse_line("V1=two").is_err());
    }
}
