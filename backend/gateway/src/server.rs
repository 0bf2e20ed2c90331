//! Main HTTP Gateway Server.
//!
//! Serves the WebSocket endpoint plus the health and room inspection APIs.

use anyhow::Result;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, instrument};

use crate::health_api;
use crate::room_api;
use crate::session_manager::SessionManager;
use crate::ws_server::ws_handler;

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub manager: Arc<SessionManager>,
    pub started_at: Instant,
}

impl GatewayState {
    pub fn new(manager: Arc<SessionManager>) -> Self {
        Self {
            manager,
            started_at: Instant::now(),
        }
    }
}

/// Builds the router. WebSocket clients may connect on `/` or `/ws`.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .route("/ws", get(ws_handler))
        .route("/api/health", get(health_api::get_health))
        .route("/api/rooms/:code", get(room_api::get_room))
        .with_state(state)
}

/// Starts the Axum HTTP server for the gateway.
#[instrument(skip(state))]
pub async fn start_server(addr: SocketAddr, state: GatewayState) -> Result<()> {
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = TcpListener::bind(&addr).await?;
    info!("Gateway listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
