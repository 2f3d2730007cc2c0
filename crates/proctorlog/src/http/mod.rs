//! HTTP/JSON surface of proctorlog.
//!
//! Routes map one-to-one onto [`RecordStore`] operations. CORS is wide open:
//! any origin, method and header, credentials included.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::storage::RecordStore;

pub use error::ApiError;

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The record store all handlers read and append to.
    pub store: Arc<dyn RecordStore>,
}

impl AppState {
    /// Wrap a store.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_checker))
        .route("/register", post(handlers::register_student))
        .route("/login", post(handlers::login_student))
        .route("/students", get(handlers::list_students))
        .route("/start_exam", post(handlers::start_exam))
        .route("/flag_event", post(handlers::flag_event))
        .route("/proctoring_logs", get(handlers::list_logs))
        .route("/risk_score", get(handlers::risk_score))
        .route("/review_decision", post(handlers::review_decision))
        // mirrors the request origin so credentials stay allowed
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `store` on `addr` until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(addr: SocketAddr, store: Arc<dyn RecordStore>) -> anyhow::Result<()> {
    let app = build_router(AppState::new(store));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
