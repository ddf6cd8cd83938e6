/*
 * Responsibility
 * - Load Config → build the identity hook → assemble the Router
 * - Apply HTTP middleware (request id, tracing, limits)
 * - Start serving with connection info (caller IP for the hook)
 */
use std::net::SocketAddr;
use std::{panic, process};

use anyhow::Result;
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::middleware::http::{self, HttpLimits};
use crate::services::auth::build_identity_hook;
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,sign_gate=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr can be hidden depending on how the process is launched.
        tracing::error!(?info, "panic");

        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting in {:?} mode on {} ({:?} origin)",
        config.app_env,
        config.addr,
        config.trust_level
    );

    let identity = build_identity_hook(&config).await?;
    let state = AppState::new(identity);
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

fn build_router(state: AppState, config: &Config) -> Router {
    let rpc = api::v1::rpc_services(&state);
    let router = Router::new()
        .nest("/api/v1", api::v1::routes())
        .with_state(state)
        .merge(rpc);

    http::apply(
        router,
        HttpLimits {
            body_limit_bytes: config.http_body_limit_bytes,
            timeout: config.http_timeout,
        },
    )
}
