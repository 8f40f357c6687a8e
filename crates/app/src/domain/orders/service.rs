//! Orders repository.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;

use crate::domain::{
    ledger::IdempotencyKey,
    orders::{
        errors::OrdersServiceError,
        records::{OrderRecord, OrderUuid},
    },
    tenants::records::TenantUuid,
};

#[derive(Debug, Default)]
struct OrdersTable {
    orders: FxHashMap<(TenantUuid, OrderUuid), OrderRecord>,
    by_key: FxHashMap<(TenantUuid, IdempotencyKey), OrderUuid>,
}

/// In-memory order storage indexed by id and by idempotency key.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrdersRepository {
    table: Arc<RwLock<OrdersTable>>,
}

impl InMemoryOrdersRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrdersRepository for InMemoryOrdersRepository {
    async fn save(&self, order: OrderRecord) -> Result<OrderRecord, OrdersServiceError> {
        let mut table = self.table.write().await;

        let id = (order.tenant, order.uuid);
        let key = (order.tenant, order.idempotency_key.clone());

        if table.orders.contains_key(&id) {
            return Err(OrdersServiceError::AlreadyExists(order.uuid));
        }

        if table.by_key.contains_key(&key) {
            return Err(OrdersServiceError::DuplicateIdempotencyKey(
                order.idempotency_key,
            ));
        }

        table.by_key.insert(key, order.uuid);
        table.orders.insert(id, order.clone());

        Ok(order)
    }

    async fn load(
        &self,
        tenant: TenantUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        self.table
            .read()
            .await
            .orders
            .get(&(tenant, order))
            .cloned()
            .ok_or(OrdersServiceError::NotFound(order))
    }

    async fn find_by_idempotency_key(
        &self,
        tenant: TenantUuid,
        key: &IdempotencyKey,
    ) -> Result<Option<OrderRecord>, OrdersServiceError> {
        let table = self.table.read().await;

        Ok(table
            .by_key
            .get(&(tenant, key.clone()))
            .and_then(|order| table.orders.get(&(tenant, *order)))
            .cloned())
    }

    async fn created_since(&self, since: Timestamp) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let mut orders: Vec<_> = self
            .table
            .read()
            .await
            .orders
            .values()
            .filter(|order| order.created_at >= since)
            .cloned()
            .collect();

        orders.sort_by_key(|order| order.created_at);

        Ok(orders)
    }
}

#[automock]
#[async_trait]
pub trait OrdersRepository: Send + Sync {
    /// Persist a new order. At most one order may exist per idempotency key.
    async fn save(&self, order: OrderRecord) -> Result<OrderRecord, OrdersServiceError>;

    /// Load an order by id.
    async fn load(
        &self,
        tenant: TenantUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// The order created by the commit with `key`, if any.
    async fn find_by_idempotency_key(
        &self,
        tenant: TenantUuid,
        key: &IdempotencyKey,
    ) -> Result<Option<OrderRecord>, OrdersServiceError>;

    /// Every order, across tenants, created at or after `since`.
    async fn created_since(&self, since: Timestamp) -> Result<Vec<OrderRecord>, OrdersServiceError>;
}
