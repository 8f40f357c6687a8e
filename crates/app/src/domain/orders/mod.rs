//! Orders

pub mod errors;
pub mod records;
pub mod service;

pub use errors::OrdersServiceError;
pub use service::*;
