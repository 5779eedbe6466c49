//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router serves the websocket endpoint, a liveness probe, and a
//! read-only room summary. CORS is wide open: any origin may connect.

pub mod ws;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::frame::ErrorCode;
use crate::state::{AppState, RoomStats};

#[must_use]
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .route("/api/rooms", get(list_rooms))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn list_rooms(State(state): State<AppState>) -> Result<Json<Vec<RoomStats>>, StatusCode> {
    state.hub.stats().await.map(Json).map_err(|e| {
        error!(code = e.error_code(), error = %e, "room stats unavailable");
        StatusCode::SERVICE_UNAVAILABLE
    })
}
