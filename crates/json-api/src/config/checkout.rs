//! Checkout Config

use std::{path::PathBuf, time::Duration};

use checkout_app::domain::checkout::CheckoutSettings;
use clap::Args;

/// Store seeding and timeout settings.
#[derive(Debug, Args)]
pub struct CheckoutConfig {
    /// YAML fixture file with tenants, catalog, stock and pricing rules
    #[arg(long, env = "CHECKOUT_FIXTURE")]
    pub fixture: PathBuf,

    /// Timeout for catalog, discount and pricing rule lookups.
    #[arg(long, env = "LOOKUP_TIMEOUT_MS", default_value_t = 2_000_u64)]
    pub lookup_timeout_ms: u64,

    /// Timeout for taking or releasing a reservation.
    #[arg(long, env = "RESERVATION_TIMEOUT_MS", default_value_t = 5_000_u64)]
    pub reservation_timeout_ms: u64,

    /// Timeout for ledger and order storage calls.
    #[arg(long, env = "PERSISTENCE_TIMEOUT_MS", default_value_t = 5_000_u64)]
    pub persistence_timeout_ms: u64,

    /// Age after which a pending commit is reconciled.
    #[arg(long, env = "PENDING_TIMEOUT_SECONDS", default_value_t = 30_u64)]
    pub pending_timeout_seconds: u64,

    /// How long completed idempotency records are kept.
    #[arg(long, env = "IDEMPOTENCY_RETENTION_HOURS", default_value_t = 24_u64)]
    pub idempotency_retention_hours: u64,

    /// Time between reconciliation passes.
    #[arg(long, env = "RECONCILE_INTERVAL_SECONDS", default_value_t = 10_u64)]
    pub reconcile_interval_seconds: u64,
}

impl CheckoutConfig {
    /// Orchestrator settings from the configured timeouts.
    #[must_use]
    pub fn settings(&self) -> CheckoutSettings {
        CheckoutSettings {
            lookup_timeout: Duration::from_millis(self.lookup_timeout_ms),
            reservation_timeout: Duration::from_millis(self.reservation_timeout_ms),
            persistence_timeout: Duration::from_millis(self.persistence_timeout_ms),
            pending_timeout: Duration::from_secs(self.pending_timeout_seconds),
            retention: Duration::from_secs(self.idempotency_retention_hours.saturating_mul(60 * 60)),
            reconcile_interval: Duration::from_secs(self.reconcile_interval_seconds),
        }
    }
}
