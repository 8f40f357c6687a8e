//! Checkout request and response bodies.

use checkout::{
    destination::Destination,
    discounts::{Discount, DiscountCode},
    items::LineItem,
    money::Money,
    preview::CheckoutPreview,
};
use checkout_app::domain::checkout::{CartLine, CheckoutRequest};
use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};

/// Cart Line
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartLineRequest {
    /// Variant identifier
    pub variant: String,

    /// Quantity, at least one
    pub quantity: u32,
}

/// Shipping Destination
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct DestinationRequest {
    /// ISO-3166 alpha-2 country code
    pub country: String,

    /// Subdivision code, such as a US state
    #[serde(default)]
    pub region: Option<String>,

    /// Postal code
    #[serde(default)]
    pub postal_code: Option<String>,
}

/// Checkout Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CheckoutRequestBody {
    /// Cart lines; repeated variants are merged
    pub lines: Vec<CartLineRequest>,

    /// Discount codes, applied in the order given
    #[serde(default)]
    pub discount_codes: Vec<String>,

    /// Where the order ships to
    pub destination: DestinationRequest,

    /// Payment authorisation reference; required to commit
    #[serde(default)]
    pub payment_ref: String,
}

impl From<CheckoutRequestBody> for CheckoutRequest {
    fn from(body: CheckoutRequestBody) -> Self {
        CheckoutRequest {
            lines: body
                .lines
                .into_iter()
                .map(|line| CartLine::new(line.variant.as_str(), line.quantity))
                .collect(),
            discount_codes: body
                .discount_codes
                .iter()
                .map(|code| DiscountCode::from(code.as_str()))
                .collect(),
            destination: Destination::new(
                &body.destination.country,
                body.destination.region.as_deref(),
                body.destination.postal_code.as_deref(),
            ),
            payment_ref: body.payment_ref,
        }
    }
}

/// Money Amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub(crate) struct MoneyResponse {
    /// Decimal amount at the currency's minor-unit scale, e.g. `"19.20"`
    pub amount: String,

    /// ISO-4217 currency code
    pub currency: String,
}

impl From<Money> for MoneyResponse {
    fn from(money: Money) -> Self {
        Self {
            amount: money.to_decimal().to_string(),
            currency: money.currency_code().to_string(),
        }
    }
}

/// Priced Line Item
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct LineItemResponse {
    pub variant: String,
    pub quantity: u32,
    pub unit_price: MoneyResponse,
    pub line_total: MoneyResponse,
}

impl From<&LineItem> for LineItemResponse {
    fn from(line: &LineItem) -> Self {
        Self {
            variant: line.variant().to_string(),
            quantity: line.quantity(),
            unit_price: line.unit_price().into(),
            line_total: line.line_total().into(),
        }
    }
}

/// Applied Discount
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct DiscountResponse {
    /// Discount code as resolved
    pub code: String,

    /// Amount actually applied after clamping
    pub amount: MoneyResponse,
}

impl From<&Discount> for DiscountResponse {
    fn from(discount: &Discount) -> Self {
        Self {
            code: discount.code.to_string(),
            amount: discount.amount.into(),
        }
    }
}

/// Checkout Preview
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct PreviewResponse {
    pub subtotal: MoneyResponse,
    pub discounts: Vec<DiscountResponse>,
    pub tax: MoneyResponse,
    pub shipping: MoneyResponse,
    pub total: MoneyResponse,
    pub currency: String,
    pub line_items: Vec<LineItemResponse>,
}

impl From<&CheckoutPreview> for PreviewResponse {
    fn from(preview: &CheckoutPreview) -> Self {
        Self {
            subtotal: preview.subtotal.into(),
            discounts: preview.discounts.iter().map(Into::into).collect(),
            tax: preview.tax.into(),
            shipping: preview.shipping.into(),
            total: preview.total.into(),
            currency: preview.currency.clone(),
            line_items: preview.line_items.iter().map(Into::into).collect(),
        }
    }
}
