//! API DTOs and error mapping

use crate::domain::session::entity::{CallPlan, CallSummary, Message, Session};
use crate::domain::shared::error::DomainError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

/// Generic API response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Domain error carried to the HTTP layer
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            DomainError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            DomainError::InvalidState(_) => (StatusCode::CONFLICT, "invalid_state"),
            DomainError::AttemptInProgress(_) => (StatusCode::CONFLICT, "attempt_in_progress"),
            DomainError::DuplicateKey(_) => (StatusCode::CONFLICT, "duplicate_key"),
            DomainError::AlreadyResolved(_) => (StatusCode::CONFLICT, "already_resolved"),
            DomainError::AuthenticationFailed => (StatusCode::UNAUTHORIZED, "invalid_signature"),
            DomainError::Provider(_) => (StatusCode::BAD_GATEWAY, "provider_error"),
            DomainError::NotConfigured(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "server_not_configured")
            }
            DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "missing_parameters"),
            DomainError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };
        let body = Json(json!({
            "error": code,
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct FinalizeRequest {
    pub to_number: String,
    pub prompt: String,
    pub username: Option<String>,
}

impl From<FinalizeRequest> for CallPlan {
    fn from(req: FinalizeRequest) -> Self {
        CallPlan {
            to_number: req.to_number,
            prompt: req.prompt,
            username: req.username,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OutboundCallRequest {
    pub assistant_id: Uuid,
    /// Inline parameters override the finalized call plan
    pub call_parameters: Option<CallPlan>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OutboundCallResponse {
    pub status: String,
    pub conversation_id: String,
    pub assistant_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub conversation_id: String,
    pub transcript: Option<String>,
    pub recording_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageDto {
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            role: match message.role {
                crate::domain::session::entity::MessageRole::User => "user".to_string(),
                crate::domain::session::entity::MessageRole::Assistant => "assistant".to_string(),
            },
            content: message.content.clone(),
            timestamp: message.timestamp,
        }
    }
}

/// Session snapshot response
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub name: String,
    pub state: String,
    pub messages: Vec<MessageDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_plan: Option<CallPlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_conversation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<CallSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            id: session.id(),
            name: session.name().to_string(),
            state: session.state().as_str().to_string(),
            messages: session.messages().iter().map(MessageDto::from).collect(),
            call_plan: session.call_plan().cloned(),
            active_conversation_id: session.active_attempt().map(str::to_string),
            summary: session.summary().cloned(),
            created_at: session.created_at(),
            updated_at: session.updated_at(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    pub session: SessionResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionResponse>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub abandoned_attempt: Option<String>,
}
