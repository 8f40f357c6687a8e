//! State

use std::{collections::BTreeSet, sync::Arc};

use checkout_app::{
    context::AppContext,
    domain::{checkout::CheckoutService, tenants::records::TenantUuid},
};

#[derive(Clone)]
pub(crate) struct State {
    pub(crate) checkout: Arc<dyn CheckoutService>,
    pub(crate) tenants: BTreeSet<TenantUuid>,
}

impl State {
    #[must_use]
    pub(crate) fn new(
        checkout: Arc<dyn CheckoutService>,
        tenants: impl IntoIterator<Item = TenantUuid>,
    ) -> Self {
        Self {
            checkout,
            tenants: tenants.into_iter().collect(),
        }
    }

    #[must_use]
    pub(crate) fn from_app_context(app: &AppContext) -> Arc<Self> {
        Arc::new(Self::new(
            Arc::clone(&app.checkout),
            app.tenants.iter().map(|tenant| tenant.uuid),
        ))
    }

    pub(crate) fn is_known_tenant(&self, tenant: TenantUuid) -> bool {
        self.tenants.contains(&tenant)
    }
}
