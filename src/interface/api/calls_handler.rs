//! Outbound call trigger and conversation proxy handlers

use super::dto::{
    ApiError, ApiResponse, ConversationResponse, OutboundCallRequest, OutboundCallResponse,
};
use super::session_handler::AppState;
use super::sse::LiveEvent;
use crate::domain::shared::error::DomainError;
use axum::extract::{Path, State};
use axum::Json;
use tracing::{error, info, warn};

/// Trigger an outbound call for a finalized session
///
/// The session is reserved (Finalized → Calling) before the provider is
/// invoked, so a second concurrent trigger fails with AttemptInProgress
/// instead of placing a second call. The provider's conversation id becomes
/// the correlation key only after the provider accepted the call; on
/// provider failure the reservation is rolled back so no phantom pending
/// state survives.
pub async fn outbound_call(
    State(state): State<AppState>,
    Json(req): Json<OutboundCallRequest>,
) -> Result<Json<ApiResponse<OutboundCallResponse>>, ApiError> {
    let assistant_id = req.assistant_id;
    info!("API: Outbound call trigger for session {}", assistant_id);

    if let Some(plan) = &req.call_parameters {
        if plan.to_number.trim().is_empty() || plan.prompt.trim().is_empty() {
            return Err(DomainError::Validation(
                "Both 'to_number' and 'prompt' are required.".to_string(),
            )
            .into());
        }
    }

    let stored_plan = state.store.begin_call(assistant_id).await?;
    let plan = req.call_parameters.unwrap_or(stored_plan);

    let handle = match state.provider.start_outbound_call(&plan).await {
        Ok(handle) => handle,
        Err(e) => {
            error!("Provider rejected outbound call for {}: {}", assistant_id, e);
            rollback(&state, assistant_id).await;
            return Err(e.into());
        }
    };

    if let Err(e) = state
        .correlator
        .register(&handle.conversation_id, assistant_id)
        .await
    {
        error!(
            "Failed to register attempt {} for {}: {}",
            handle.conversation_id, assistant_id, e
        );
        rollback(&state, assistant_id).await;
        return Err(e.into());
    }

    if let Err(e) = state
        .store
        .attach_attempt(assistant_id, handle.conversation_id.clone())
        .await
    {
        state.correlator.unregister(&handle.conversation_id).await;
        rollback(&state, assistant_id).await;
        return Err(e.into());
    }

    info!(
        "API: Call initiated for {} as conversation {}",
        assistant_id, handle.conversation_id
    );
    state.broadcaster.publish(LiveEvent::CallUpdated {
        assistant_id,
        status: "initiated".to_string(),
    });

    Ok(Json(ApiResponse::success(OutboundCallResponse {
        status: "initiated".to_string(),
        conversation_id: handle.conversation_id,
        assistant_id,
    })))
}

async fn rollback(state: &AppState, assistant_id: uuid::Uuid) {
    if let Err(e) = state.store.clear_call(assistant_id).await {
        // Session may have been deleted mid-trigger; nothing left to roll back
        warn!("Rollback of session {} failed: {}", assistant_id, e);
    }
}

/// Fetch transcript and recording reference for a conversation
///
/// Read-only proxy; never mutates session state.
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> Result<Json<ApiResponse<ConversationResponse>>, ApiError> {
    info!("API: Fetching conversation {}", conversation_id);

    let detail = state.provider.fetch_conversation(&conversation_id).await?;

    Ok(Json(ApiResponse::success(ConversationResponse {
        conversation_id: detail.conversation_id,
        transcript: detail.transcript,
        recording_url: detail.recording_url,
    })))
}
