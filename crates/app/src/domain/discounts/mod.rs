//! Discount Codes

pub mod errors;
pub mod service;

pub use errors::DiscountsServiceError;
pub use service::*;
