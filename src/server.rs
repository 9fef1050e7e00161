use axum::{
    http::Method,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api;
use crate::app::TrackerService;
use crate::error::Result;
use tracker_core::TenantId;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: TrackerService,
    /// Tenant used when a request carries no `X-Tenant-Id` header
    pub default_tenant: Option<TenantId>,
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "life-trackers",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Create the HTTP router with every tracker resource
pub fn create_server(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .merge(api::health_screening::routes())
        .merge(api::financial_goals::routes())
        .merge(api::vehicle_maintenance::routes())
        .merge(api::mortgage::routes())
        .merge(api::time_audit::routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Binds `addr` and serves until the process is stopped.
pub async fn serve(state: AppState, addr: &str) -> Result<()> {
    let app = create_server(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Tracker API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
