//! Trusioo JSON API Server

use std::{process, time::Duration};

use salvo::{
    affix_state::inject,
    catch_panic::CatchPanic,
    oapi::{
        OpenApi,
        security::{Http, HttpAuthScheme, SecurityScheme},
        swagger_ui::SwaggerUi,
    },
    prelude::*,
    rate_limiter::{BasicQuota, FixedGuard, MokaStore, RateLimiter, RemoteIpIssuer},
    size_limiter::max_size,
    timeout::Timeout,
    trailing_slash::remove_slash,
};
use tracing::{error, info};

use trusioo_app::context::AppContext;

use crate::{
    config::ServerConfig,
    observability::{Observability, RequestLogging, metrics_handler},
    state::State,
};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod auth;
mod card_detection;
mod config;
mod envelope;
mod errors;
mod extensions;
mod healthcheck;
mod observability;
mod router;
mod shutdown;
mod state;
mod sweep;
#[cfg(test)]
mod test_helpers;
mod users;
mod verification;

/// Per client IP quota over a fixed window.
fn rate_limiter(requests: usize, window_seconds: u32) -> impl Handler {
    RateLimiter::new(
        FixedGuard::new(),
        MokaStore::new(),
        RemoteIpIssuer,
        BasicQuota::set_seconds(requests, i64::from(window_seconds)),
    )
}

/// Trusioo JSON API Server entry point
#[tokio::main]
pub async fn main() {
    let config = ServerConfig::load().unwrap_or_else(|e| {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized yet, must use eprintln for config errors"
        )]
        {
            eprintln!("Configuration error: {e}");
        }

        process::exit(1);
    });

    let observability = match Observability::init(&config) {
        Ok(observability) => observability,
        Err(init_error) => {
            #[expect(
                clippy::print_stderr,
                reason = "the subscriber failed to install, so tracing output goes nowhere"
            )]
            {
                eprintln!("Observability error: {init_error}");
            }

            process::exit(1);
        }
    };

    let app =
        match AppContext::from_database_url(&config.database.database_url, config.app_settings())
            .await
        {
            Ok(app) => app,
            Err(init_error) => {
                error!(error = ?init_error, "failed to initialize app context");

                process::exit(1);
            }
        };

    let sweeper = sweep::spawn(
        app.verification.clone(),
        Duration::from_secs(config.verification.sweep_interval_seconds.max(1)),
    );

    let addr = config.socket_addr();

    info!(
        %addr,
        card_detection = config.card_detection.enabled,
        "starting server"
    );

    let listener = TcpListener::new(addr).bind().await;

    let router = Router::new()
        .hoop(CatchPanic::new())
        .hoop(remove_slash())
        .hoop(RequestLogging::new(&config.observability))
        .hoop(max_size(config.request.max_body_size))
        .hoop(Timeout::new(config.request.timeout()))
        .hoop(rate_limiter(
            config.rate_limit.requests,
            config.rate_limit.window_seconds,
        ))
        .hoop(inject(State::from_app_context(app)))
        .push(Router::with_path("healthcheck").get(healthcheck::handler))
        .push(Router::with_path("metrics").get(metrics_handler))
        .push(router::api_router(rate_limiter(
            config.rate_limit.auth_requests,
            config.rate_limit.auth_window_seconds,
        )));

    let doc = OpenApi::new("Trusioo API", env!("CARGO_PKG_VERSION"))
        .add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer).bearer_format("JWT")),
        )
        .merge_router(&router);

    let router = router
        .push(doc.into_router("/api-doc/openapi.json"))
        .push(SwaggerUi::new("/api-doc/openapi.json").into_router("docs"));

    let server = Server::new(listener);

    let handle = server.handle();
    let grace = config.server.shutdown_grace();

    tokio::spawn(async move {
        if let Err(error) = shutdown::listen(handle, grace).await {
            error!("failed to listen for shutdown signal: {error}");
        }
    });

    server.serve(router).await;

    sweeper.abort();

    info!("server stopped");

    observability.shutdown();
}
