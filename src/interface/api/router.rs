//! API Router configuration

use super::calls_handler::{get_conversation, outbound_call};
use super::session_handler::{
    create_session, delete_session, finalize_session, get_session, health_check, list_sessions,
    post_message, AppState,
};
use super::sse::stream_handler;
use super::webhook_handler::elevenlabs_webhook;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the API router
pub fn build_router(state: AppState) -> Router {
    // Health check route (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    // Session management routes
    let session_routes = Router::new()
        .route("/api/sessions", post(create_session).get(list_sessions))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .route("/api/sessions/:id/messages", post(post_message))
        .route("/api/sessions/:id/finalize", post(finalize_session));

    // Call routes: trigger, live-update stream, conversation proxy
    let call_routes = Router::new()
        .route("/api/calls/outbound", post(outbound_call))
        .route("/api/calls/stream", get(stream_handler))
        .route("/api/conversations/:conversation_id", get(get_conversation));

    // Provider webhook routes
    let webhook_routes = Router::new().route("/api/webhooks/elevenlabs", post(elevenlabs_webhook));

    Router::new()
        .merge(health_routes)
        .merge(session_routes)
        .merge(call_routes)
        .merge(webhook_routes)
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
