//! Webhook router configuration

use crate::interface::api::voice_handler::{
    handle_inbound_call, handle_process, handle_voicemail, health_check, AppState,
};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the webhook router
pub fn build_router(state: AppState) -> Router {
    let voice_routes = Router::new()
        .route("/voice/inbound", post(handle_inbound_call))
        .route("/voice/process", post(handle_process))
        .route("/voice/voicemail", post(handle_voicemail));

    Router::new()
        .route("/health", get(health_check))
        .merge(voice_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
