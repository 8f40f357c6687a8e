//! Reservations
//!
//! Stock holds and payment authorisation taken when an order is committed.

pub mod errors;
pub mod inventory;
pub mod models;
pub mod service;

pub use errors::ReservationServiceError;
pub use inventory::{Inventory, StockLevel};
pub use service::*;
