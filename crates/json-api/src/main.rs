//! Checkout JSON API Server

use std::process::ExitCode;

use salvo::{
    affix_state::inject,
    catch_panic::CatchPanic,
    oapi::{OpenApi, swagger_ui::SwaggerUi},
    prelude::*,
    trailing_slash::remove_slash,
};
use tracing::{error, info};

use checkout_app::{context::AppContext, domain::checkout::spawn_reconciler, fixtures::Fixtures};

use crate::{config::ServerConfig, state::State};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod checkouts;
mod config;
mod extensions;
mod healthcheck;
mod observability;
mod orders;
mod router;
mod shutdown;
mod state;
mod tenants;
#[cfg(test)]
mod test_helpers;

/// Checkout JSON API Server entry point
#[tokio::main]
pub async fn main() -> ExitCode {
    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(error) => {
            #[expect(
                clippy::print_stderr,
                reason = "logging not initialized yet, must use eprintln for config errors"
            )]
            {
                eprintln!("Configuration error: {error}");
            }

            return ExitCode::FAILURE;
        }
    };

    if let Err(error) = observability::init_logging(&config) {
        #[expect(
            clippy::print_stderr,
            reason = "logging failed to initialise, must use eprintln"
        )]
        {
            eprintln!("{error}");
        }

        return ExitCode::FAILURE;
    }

    let app = match load_app(&config).await {
        Ok(app) => app,
        Err(init_error) => {
            error!("failed to initialize app context: {init_error}");

            return ExitCode::FAILURE;
        }
    };

    let addr = config.socket_addr();

    info!(tenants = app.tenants.len(), "Starting server on {addr}");

    let listener = TcpListener::new(addr).bind().await;

    let reconciler = spawn_reconciler(app.reconciler());

    let router = Router::new()
        .hoop(CatchPanic::new())
        .hoop(remove_slash())
        .hoop(observability::request_logging)
        .hoop(inject(State::from_app_context(&app)))
        .push(Router::with_path("healthcheck").get(healthcheck::handler))
        .push(router::app_router());

    let doc = OpenApi::new("Checkout API", env!("CARGO_PKG_VERSION")).merge_router(&router);

    let router = router
        .push(doc.into_router("/api-doc/openapi.json"))
        .push(SwaggerUi::new("/api-doc/openapi.json").into_router("docs"));

    let server = Server::new(listener);

    let handle = server.handle();

    tokio::spawn(async move {
        if let Err(error) = shutdown::listen(handle, vec![reconciler]).await {
            error!("failed to listen for shutdown signal: {error}");
        }
    });

    server.serve(router).await;

    ExitCode::SUCCESS
}

async fn load_app(config: &ServerConfig) -> Result<AppContext, String> {
    let fixtures = Fixtures::load(&config.checkout.fixture).map_err(|error| {
        format!(
            "failed to load fixture {}: {error}",
            config.checkout.fixture.display()
        )
    })?;

    AppContext::from_fixtures(&fixtures, config.checkout.settings())
        .await
        .map_err(|error| error.to_string())
}
