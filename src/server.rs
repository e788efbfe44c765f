//! Server initialization and routing
//!
//! This module handles the Axum server setup including:
//! - Router configuration with all API endpoints
//! - Middleware stack (request IDs, logging, timeout)
//! - TLS accept loop handing connections to hyper
//! - Graceful shutdown handling

use crate::config::ServerConfig;
use crate::db::Db;
use crate::middleware::{log_requests, request_id};
use crate::routes::{fruits, health, home, sleep};
use crate::state::ServerState;
use crate::tls;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::{any, get};
use axum::Router;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use hyper_util::service::TowerToHyperService;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the Axum router with all routes and middleware
///
/// Middleware stack (applied in reverse order):
/// 1. Request ID tracking
/// 2. Request logging
/// 3. Outer timeout
pub fn build_router(state: Arc<ServerState>) -> Router {
    let api = Router::new()
        .route(
            "/api/v1/fruits",
            get(fruits::list_fruits).post(fruits::create_fruit),
        )
        .route("/api/v1/fruits/{id}", get(fruits::get_fruit))
        .route("/api/v1/sleep", get(sleep::sleep));

    Router::new()
        .merge(api)
        .route("/health", get(health::health_check))
        .route("/", any(home))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.timeout(),
        ))
        .layer(from_fn(request_id))
        .layer(from_fn(log_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTPS server
///
/// Connects to storage, verifies reachability, then serves TLS connections
/// until SIGTERM or Ctrl+C. Any failure before the listener is up is
/// returned to the caller and terminates the process.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(config.log_level.as_str())
        .with_target(false)
        .json()
        .init();

    // Storage must be reachable before the listener comes up
    let db = Db::connect(&config.database).await?;
    db.ping().await?;
    tracing::info!(
        host = %config.database.host,
        dbname = %config.database.dbname,
        "connected to storage"
    );

    let acceptor = tls::load_tls_acceptor(&config.tls)?;
    let addr = config.socket_addr()?;

    let state = Arc::new(ServerState::new(config, db));
    let app = build_router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("server started on https://{addr}");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = accepted?;
                let acceptor = acceptor.clone();
                let app = app.clone();

                tokio::spawn(async move {
                    match acceptor.accept(stream).await {
                        Ok(tls_stream) => {
                            let service = TowerToHyperService::new(app);
                            if let Err(e) = auto::Builder::new(TokioExecutor::new())
                                .serve_connection_with_upgrades(TokioIo::new(tls_stream), service)
                                .await
                            {
                                tracing::debug!(peer = %peer, error = %e, "connection closed with error");
                            }
                        }
                        Err(e) => tracing::warn!(peer = %peer, error = %e, "TLS handshake failed"),
                    }
                });
            }

            () = &mut shutdown => {
                tracing::info!("shutdown signal received, stopping listener");
                break;
            }
        }
    }

    tracing::info!("server shutdown complete");
    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
