//! Discounts service errors.

use checkout::discounts::DiscountCode;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiscountsServiceError {
    #[error("invalid discount code {0}")]
    InvalidCode(DiscountCode),
}
