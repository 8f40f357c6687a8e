//! Checkout Handlers

pub(crate) mod commit;
pub(crate) mod preview;
