//! Test support.

pub(crate) mod helpers;

pub(crate) use context::{DECLINED, TestContext};
