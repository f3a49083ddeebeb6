//! Session API handlers

use super::dto::{
    ApiError, ApiResponse, ChatResponse, CreateSessionRequest, DeleteResponse, FinalizeRequest,
    PostMessageRequest, SessionListResponse, SessionResponse,
};
use super::sse::EventBroadcaster;
use crate::domain::chat::ChatCompletion;
use crate::domain::correlation::Correlator;
use crate::domain::session::entity::MessageRole;
use crate::domain::session::store::SessionStore;
use crate::domain::shared::error::DomainError;
use crate::infrastructure::provider::CallProvider;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Application state
///
/// All registries live for the process lifetime and are injected into the
/// handlers at startup; nothing is reachable through ambient globals.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore>,
    pub correlator: Arc<Correlator>,
    pub broadcaster: Arc<EventBroadcaster>,
    pub provider: Arc<dyn CallProvider>,
    pub chat: Arc<dyn ChatCompletion>,
    /// Shared webhook secret; None disables signature verification
    pub webhook_secret: Option<String>,
}

/// Health check
pub async fn health_check() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// Create a new session
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SessionResponse>>), ApiError> {
    if req.name.trim().is_empty() {
        return Err(DomainError::Validation("'name' is required".to_string()).into());
    }

    let session = state.store.create(req.name).await;
    info!("API: Created session {} ({})", session.name(), session.id());

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(session.into())),
    ))
}

/// List all sessions
pub async fn list_sessions(
    State(state): State<AppState>,
) -> Json<ApiResponse<SessionListResponse>> {
    let sessions: Vec<SessionResponse> = state
        .store
        .list()
        .await
        .into_iter()
        .map(SessionResponse::from)
        .collect();
    let total = sessions.len();

    Json(ApiResponse::success(SessionListResponse { sessions, total }))
}

/// Get a session by id
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SessionResponse>>, ApiError> {
    let session = state.store.get(id).await?;
    Ok(Json(ApiResponse::success(session.into())))
}

/// Append a user message and produce the assistant's reply
pub async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<PostMessageRequest>,
) -> Result<Json<ApiResponse<ChatResponse>>, ApiError> {
    if req.content.trim().is_empty() {
        return Err(DomainError::Validation("'content' is required".to_string()).into());
    }

    let session = state
        .store
        .append_message(id, MessageRole::User, req.content)
        .await?;

    let reply = state.chat.complete(session.messages()).await?;
    let session = state
        .store
        .append_message(id, MessageRole::Assistant, reply.clone())
        .await?;

    Ok(Json(ApiResponse::success(ChatResponse {
        reply,
        session: session.into(),
    })))
}

/// Finalize a session, freezing chat and producing the call plan
pub async fn finalize_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<FinalizeRequest>,
) -> Result<Json<ApiResponse<SessionResponse>>, ApiError> {
    if req.to_number.trim().is_empty() || req.prompt.trim().is_empty() {
        return Err(DomainError::Validation(
            "Both 'to_number' and 'prompt' are required.".to_string(),
        )
        .into());
    }

    let session = state.store.finalize(id, req.into()).await?;
    info!("API: Finalized session {}", id);

    Ok(Json(ApiResponse::success(session.into())))
}

/// Delete a session, abandoning any pending call attempt
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeleteResponse>>, ApiError> {
    let abandoned = state.store.delete(id).await?;
    if let Some(key) = &abandoned {
        state.correlator.abandon(key).await;
        info!("API: Deleted session {}, abandoned attempt {}", id, key);
    } else {
        info!("API: Deleted session {}", id);
    }

    Ok(Json(ApiResponse::success(DeleteResponse {
        deleted: true,
        abandoned_attempt: abandoned,
    })))
}
