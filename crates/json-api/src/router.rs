//! App Router

use salvo::Router;

use crate::{checkouts, orders, tenants};

pub(crate) fn app_router() -> Router {
    Router::new()
        .hoop(tenants::middleware::handler)
        .push(
            Router::with_path("checkout")
                .push(Router::with_path("preview").post(checkouts::preview::handler))
                .push(Router::with_path("commit").post(checkouts::commit::handler)),
        )
        .push(Router::with_path("orders/{order}").get(orders::get::handler))
}
