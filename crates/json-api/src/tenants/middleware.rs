//! Tenant middleware.

use std::sync::Arc;

use checkout_app::domain::tenants::records::TenantUuid;
use salvo::prelude::*;
use tracing::debug;

use crate::{extensions::*, state::State, tenants::TENANT_HEADER};

#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let Some(tenant) = extract_tenant(req) else {
        res.render(StatusError::unauthorized().brief("Missing or invalid X-Tenant-Uuid header"));

        return;
    };

    let state = match depot.obtain_or_500::<Arc<State>>() {
        Ok(state) => state,
        Err(error) => {
            res.render(error);

            return;
        }
    };

    if !state.is_known_tenant(tenant) {
        debug!(%tenant, "rejected unknown tenant");

        res.render(StatusError::unauthorized().brief("Unknown tenant"));

        return;
    }

    depot.insert_tenant_uuid(tenant);

    ctrl.call_next(req, depot, res).await;
}

fn extract_tenant(req: &Request) -> Option<TenantUuid> {
    req.headers()
        .get(TENANT_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use checkout_app::domain::checkout::MockCheckoutService;
    use salvo::{
        affix_state::inject,
        test::{ResponseExt, TestClient},
    };
    use testresult::TestResult;

    use crate::test_helpers::{TEST_TENANT_UUID, state_with_checkout};

    use super::*;

    #[salvo::handler]
    async fn echo_tenant(depot: &mut Depot, res: &mut Response) {
        let tenant = depot.tenant_uuid_or_401().ok().map_or_else(
            || "missing".to_string(),
            |uuid: TenantUuid| uuid.to_string(),
        );

        res.render(tenant);
    }

    fn make_service() -> Service {
        let router = Router::new()
            .hoop(inject(state_with_checkout(MockCheckoutService::new())))
            .hoop(handler)
            .push(Router::new().get(echo_tenant));

        Service::new(router)
    }

    #[tokio::test]
    async fn test_missing_tenant_header_returns_401() -> TestResult {
        let res = TestClient::get("http://example.com")
            .send(&make_service())
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_tenant_header_returns_401() -> TestResult {
        let res = TestClient::get("http://example.com")
            .add_header(TENANT_HEADER, "not-a-uuid", true)
            .send(&make_service())
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_tenant_returns_401() -> TestResult {
        let res = TestClient::get("http://example.com")
            .add_header(TENANT_HEADER, TenantUuid::new().to_string(), true)
            .send(&make_service())
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }

    #[tokio::test]
    async fn test_known_tenant_is_injected() -> TestResult {
        let mut res = TestClient::get("http://example.com")
            .add_header(TENANT_HEADER, TEST_TENANT_UUID.to_string(), true)
            .send(&make_service())
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(res.take_string().await?, TEST_TENANT_UUID.to_string());

        Ok(())
    }
}
