//! Reservations service.

use std::sync::Arc;

use async_trait::async_trait;
use checkout::{items::VariantId, money::Money};
use mockall::automock;
use rustc_hash::{FxHashMap, FxHashSet};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::{
    reservations::{
        errors::ReservationServiceError,
        inventory::Inventory,
        models::{Reservation, ReservationUuid},
    },
    tenants::records::TenantUuid,
};

/// In-memory stock holds with a configurable set of declined payment references.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReservationService {
    inventory: Inventory,
    declined: Arc<Mutex<FxHashSet<(TenantUuid, String)>>>,
    open: Arc<Mutex<FxHashMap<(TenantUuid, ReservationUuid), Reservation>>>,
}

impl InMemoryReservationService {
    #[must_use]
    pub fn new(inventory: Inventory) -> Self {
        Self {
            inventory,
            ..Self::default()
        }
    }

    /// Decline every reservation made with `payment_ref` for `tenant`.
    pub async fn decline_payment_ref(&self, tenant: TenantUuid, payment_ref: impl Into<String>) {
        self.declined
            .lock()
            .await
            .insert((tenant, payment_ref.into()));
    }

    /// Number of reservations currently held for `tenant`.
    pub async fn open_reservations(&self, tenant: TenantUuid) -> usize {
        self.open
            .lock()
            .await
            .keys()
            .filter(|(owner, _)| *owner == tenant)
            .count()
    }
}

#[async_trait]
impl ReservationService for InMemoryReservationService {
    async fn reserve(
        &self,
        tenant: TenantUuid,
        lines: &[(VariantId, u32)],
        payment_ref: &str,
        amount: Money,
    ) -> Result<Reservation, ReservationServiceError> {
        if self
            .declined
            .lock()
            .await
            .contains(&(tenant, payment_ref.to_string()))
        {
            info!(%tenant, payment_ref, "payment declined");

            return Err(ReservationServiceError::PaymentDeclined(payment_ref.to_string()));
        }

        self.inventory
            .reserve_all(tenant, lines)
            .await
            .map_err(|(variant, requested, available)| {
                ReservationServiceError::InsufficientStock {
                    variant,
                    requested,
                    available,
                }
            })?;

        let reservation = Reservation {
            uuid: ReservationUuid::new(),
            tenant,
            lines: lines.to_vec(),
            payment_ref: payment_ref.to_string(),
            amount,
        };

        self.open
            .lock()
            .await
            .insert((tenant, reservation.uuid), reservation.clone());

        debug!(%tenant, reservation = %reservation.uuid, %amount, "reservation taken");

        Ok(reservation)
    }

    async fn release(
        &self,
        tenant: TenantUuid,
        reservation: ReservationUuid,
    ) -> Result<(), ReservationServiceError> {
        let released = self
            .open
            .lock()
            .await
            .remove(&(tenant, reservation))
            .ok_or(ReservationServiceError::NotFound(reservation))?;

        self.inventory.release_all(tenant, &released.lines).await;

        debug!(%tenant, %reservation, "reservation released");

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait ReservationService: Send + Sync {
    /// Hold stock for every line and authorise `amount` against `payment_ref`.
    ///
    /// Either every line is held or none is.
    async fn reserve(
        &self,
        tenant: TenantUuid,
        lines: &[(VariantId, u32)],
        payment_ref: &str,
        amount: Money,
    ) -> Result<Reservation, ReservationServiceError>;

    /// Release a reservation taken by [`ReservationService::reserve`].
    async fn release(
        &self,
        tenant: TenantUuid,
        reservation: ReservationUuid,
    ) -> Result<(), ReservationServiceError>;
}
