//! Per-client sliding-window rate limiter in front of a minimal HTTP endpoint.

pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod pruner;
pub mod rate_limit;
pub mod state;

use axum::{Router, routing::get};
use std::net::SocketAddr;

use crate::config::Args;
use crate::error::{Result, ServerError};
use crate::rate_limit::SlidingWindowLimiter;
use crate::state::AppState;

/// Build the router. Only `/` goes through the limiter.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::limited_handler))
        .route("/health", get(handlers::health_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(state)
}

/// Bind, serve until Ctrl+C/SIGTERM.
pub async fn run(args: Args) -> Result<()> {
    let config = args.limiter_config()?;
    let state = AppState::new(SlidingWindowLimiter::new(config));

    if let Some(every) = args.prune_interval() {
        tokio::spawn(pruner::idle_pruner(state.limiter.clone(), every));
    }

    let addr = args.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    tracing::info!("Server running on http://{addr}");
    tracing::info!(
        "Rate limit: {} requests per {} ms per client",
        config.max_requests(),
        config.window_ms()
    );

    axum::serve(
        listener,
        app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(ServerError::Serve)
}

// Wait for SIGTERM or Ctrl+C
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
