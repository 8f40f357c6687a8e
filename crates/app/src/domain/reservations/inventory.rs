//! Inventory
//!
//! In-memory stock levels shared by the catalog (which reports availability)
//! and the reservation service (which holds stock).

use std::sync::Arc;

use checkout::items::VariantId;
use rustc_hash::FxHashMap;
use tokio::sync::Mutex;

use crate::domain::tenants::records::TenantUuid;

/// Stock of one variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StockLevel {
    /// Units physically held.
    pub on_hand: u32,

    /// Units held by open reservations.
    pub reserved: u32,
}

impl StockLevel {
    /// Units that can still be reserved.
    #[must_use]
    pub fn available(&self) -> u32 {
        self.on_hand.saturating_sub(self.reserved)
    }
}

type StockKey = (TenantUuid, VariantId);

/// Tenant-scoped stock levels.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    levels: Arc<Mutex<FxHashMap<StockKey, StockLevel>>>,
}

impl Inventory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the on-hand count for a variant, keeping existing reservations.
    pub async fn set_on_hand(&self, tenant: TenantUuid, variant: VariantId, on_hand: u32) {
        self.levels
            .lock()
            .await
            .entry((tenant, variant))
            .or_default()
            .on_hand = on_hand;
    }

    /// Current stock level; unknown variants have no stock.
    pub async fn level(&self, tenant: TenantUuid, variant: &VariantId) -> StockLevel {
        self.levels
            .lock()
            .await
            .get(&(tenant, variant.clone()))
            .copied()
            .unwrap_or_default()
    }

    /// Reserve every line or none of them.
    ///
    /// Returns the first line that cannot be satisfied as
    /// `(variant, requested, available)`.
    pub(crate) async fn reserve_all(
        &self,
        tenant: TenantUuid,
        lines: &[(VariantId, u32)],
    ) -> Result<(), (VariantId, u32, u32)> {
        let mut levels = self.levels.lock().await;

        for (variant, quantity) in lines {
            let available = levels
                .get(&(tenant, variant.clone()))
                .map_or(0, StockLevel::available);

            if available < *quantity {
                return Err((variant.clone(), *quantity, available));
            }
        }

        for (variant, quantity) in lines {
            let level = levels.entry((tenant, variant.clone())).or_default();
            level.reserved = level.reserved.saturating_add(*quantity);
        }

        Ok(())
    }

    /// Return reserved units to the available pool.
    pub(crate) async fn release_all(&self, tenant: TenantUuid, lines: &[(VariantId, u32)]) {
        let mut levels = self.levels.lock().await;

        for (variant, quantity) in lines {
            if let Some(level) = levels.get_mut(&(tenant, variant.clone())) {
                level.reserved = level.reserved.saturating_sub(*quantity);
            }
        }
    }
}
