//! Provider webhook ingest
//!
//! Receives the provider's post-call terminal event, routes it back to the
//! owning session through the correlator and pushes the summary to live
//! subscribers. Duplicates and unknown keys are acknowledged with 200 so
//! the provider never retries indefinitely; only a signature failure is
//! rejected.

use super::dto::ApiError;
use super::session_handler::AppState;
use super::sse::LiveEvent;
use crate::domain::session::entity::CallSummary;
use crate::domain::shared::error::DomainError;
use crate::infrastructure::provider::{text_value, verify_signature};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

pub const SIGNATURE_HEADER: &str = "ElevenLabs-Signature";

/// Provider event envelope, parsed defensively
///
/// Field names vary between provider event versions; every field is
/// optional and absent values never fail the request.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub event_type: Option<String>,
    #[serde(default)]
    pub data: WebhookData,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookData {
    pub conversation_id: Option<String>,
    pub id: Option<String>,
    pub transcript: Option<Value>,
    pub recording_url: Option<String>,
    pub audio_url: Option<String>,
    pub status: Option<String>,
    pub call_status: Option<String>,
}

impl WebhookEnvelope {
    pub fn event_type(&self) -> &str {
        self.kind
            .as_deref()
            .or(self.event_type.as_deref())
            .unwrap_or("unknown")
    }

    pub fn correlation_key(&self) -> Option<&str> {
        self.data
            .conversation_id
            .as_deref()
            .or(self.data.id.as_deref())
    }

    pub fn summary(&self, conversation_id: &str) -> CallSummary {
        CallSummary {
            conversation_id: conversation_id.to_string(),
            transcript: self.data.transcript.as_ref().and_then(text_value),
            recording_url: self
                .data
                .recording_url
                .clone()
                .or_else(|| self.data.audio_url.clone()),
            status: self
                .data
                .status
                .clone()
                .or_else(|| self.data.call_status.clone()),
        }
    }
}

/// Terminal-event webhook
pub async fn elevenlabs_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    if let Some(secret) = &state.webhook_secret {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok());
        if !verify_signature(secret, &body, signature) {
            warn!("Webhook rejected: signature verification failed");
            return Err(DomainError::AuthenticationFailed.into());
        }
    }

    let envelope: WebhookEnvelope = serde_json::from_slice(&body).unwrap_or_default();
    info!("Webhook received: {}", envelope.event_type());

    let Some(key) = envelope.correlation_key().map(str::to_string) else {
        warn!("Webhook carried no correlation key, acknowledged and dropped");
        return Ok(Json(json!({"ok": true})));
    };

    match state.correlator.resolve(&key).await {
        Ok(session_id) => {
            let summary = envelope.summary(&key);
            let rendered = summary.render();
            match state.store.complete(session_id, summary).await {
                Ok(_) => {
                    info!("Conversation {} resolved to session {}", key, session_id);
                    state.broadcaster.publish(LiveEvent::CallSummary {
                        assistant_id: session_id,
                        summary: rendered,
                    });
                }
                Err(e) => {
                    // Session vanished or moved on between resolve and apply;
                    // still an ack, nothing to push
                    warn!("Could not apply summary to session {}: {}", session_id, e);
                }
            }
        }
        Err(DomainError::AlreadyResolved(_)) => {
            info!("Duplicate terminal event for {}, ignored", key);
        }
        Err(DomainError::NotFound(_)) => {
            info!("Terminal event for unknown conversation {}, ignored", key);
        }
        Err(e) => {
            warn!("Unexpected correlator failure for {}: {}", key, e);
        }
    }

    Ok(Json(json!({"ok": true})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chat::ScriptedChat;
    use crate::domain::correlation::Correlator;
    use crate::domain::session::entity::{CallPlan, MessageRole, SessionState};
    use crate::domain::session::store::SessionStore;
    use crate::infrastructure::provider::client::MockCallProvider;
    use crate::interface::api::sse::EventBroadcaster;
    use std::sync::Arc;
    use tokio::sync::broadcast::error::TryRecvError;
    use uuid::Uuid;

    fn app_state(secret: Option<&str>) -> AppState {
        AppState {
            store: Arc::new(SessionStore::new()),
            correlator: Arc::new(Correlator::new()),
            broadcaster: Arc::new(EventBroadcaster::default()),
            provider: Arc::new(MockCallProvider::new()),
            chat: Arc::new(ScriptedChat),
            webhook_secret: secret.map(str::to_string),
        }
    }

    async fn calling_session(state: &AppState, key: &str) -> Uuid {
        let session = state.store.create("test".to_string()).await;
        let id = session.id();
        state
            .store
            .append_message(id, MessageRole::User, "hi".to_string())
            .await
            .unwrap();
        state
            .store
            .finalize(
                id,
                CallPlan {
                    to_number: "+15551234567".to_string(),
                    prompt: "say hello".to_string(),
                    username: None,
                },
            )
            .await
            .unwrap();
        state.store.begin_call(id).await.unwrap();
        state.store.attach_attempt(id, key.to_string()).await.unwrap();
        state.correlator.register(key, id).await.unwrap();
        id
    }

    fn terminal_event(key: &str) -> Bytes {
        Bytes::from(
            json!({
                "type": "post_call_transcription",
                "data": {
                    "conversation_id": key,
                    "transcript": "It went well",
                    "status": "ended",
                }
            })
            .to_string(),
        )
    }

    #[tokio::test]
    async fn test_terminal_event_completes_session_and_broadcasts() {
        let state = app_state(None);
        let id = calling_session(&state, "conv-1").await;
        let mut rx = state.broadcaster.subscribe();

        let response = elevenlabs_webhook(
            State(state.clone()),
            HeaderMap::new(),
            terminal_event("conv-1"),
        )
        .await
        .unwrap();
        assert_eq!(response.0["ok"], true);

        let session = state.store.get(id).await.unwrap();
        assert_eq!(session.state(), SessionState::Completed);
        assert_eq!(
            session.summary().unwrap().transcript.as_deref(),
            Some("It went well")
        );

        match rx.recv().await.unwrap() {
            LiveEvent::CallSummary {
                assistant_id,
                summary,
            } => {
                assert_eq!(assistant_id, id);
                assert_eq!(summary, "It went well");
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[tokio::test]
    async fn test_duplicate_event_acked_without_side_effects() {
        let state = app_state(None);
        let id = calling_session(&state, "conv-1").await;
        let mut rx = state.broadcaster.subscribe();

        elevenlabs_webhook(
            State(state.clone()),
            HeaderMap::new(),
            terminal_event("conv-1"),
        )
        .await
        .unwrap();
        let first = state.store.get(id).await.unwrap();

        // Provider retry with the same key
        let response = elevenlabs_webhook(
            State(state.clone()),
            HeaderMap::new(),
            terminal_event("conv-1"),
        )
        .await
        .unwrap();
        assert_eq!(response.0["ok"], true);

        let second = state.store.get(id).await.unwrap();
        assert_eq!(second.updated_at(), first.updated_at());

        // Exactly one broadcast
        assert!(matches!(
            rx.recv().await.unwrap(),
            LiveEvent::CallSummary { .. }
        ));
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_unknown_key_acked_without_side_effects() {
        let state = app_state(None);
        let mut rx = state.broadcaster.subscribe();

        let response = elevenlabs_webhook(
            State(state.clone()),
            HeaderMap::new(),
            terminal_event("conv-unknown"),
        )
        .await
        .unwrap();
        assert_eq!(response.0["ok"], true);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_event_for_deleted_session_acked_without_mutation() {
        let state = app_state(None);
        let id = calling_session(&state, "conv-1").await;

        let abandoned = state.store.delete(id).await.unwrap();
        state.correlator.abandon(&abandoned.unwrap()).await;
        let mut rx = state.broadcaster.subscribe();

        let response = elevenlabs_webhook(
            State(state.clone()),
            HeaderMap::new(),
            terminal_event("conv-1"),
        )
        .await
        .unwrap();
        assert_eq!(response.0["ok"], true);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        assert!(state.store.get(id).await.is_err());
    }

    #[tokio::test]
    async fn test_bad_signature_rejected_before_correlation() {
        let state = app_state(Some("topsecret"));
        let id = calling_session(&state, "conv-1").await;

        let mut headers = HeaderMap::new();
        headers.insert(SIGNATURE_HEADER, "deadbeef".parse().unwrap());

        let err = elevenlabs_webhook(State(state.clone()), headers, terminal_event("conv-1"))
            .await
            .unwrap_err();
        assert!(matches!(err.0, DomainError::AuthenticationFailed));

        // Attempt still pending, session untouched
        let session = state.store.get(id).await.unwrap();
        assert_eq!(session.state(), SessionState::Calling);
        assert!(state.correlator.resolve("conv-1").await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_signature_rejected_when_secret_configured() {
        let state = app_state(Some("topsecret"));

        let err = elevenlabs_webhook(State(state), HeaderMap::new(), terminal_event("conv-1"))
            .await
            .unwrap_err();
        assert!(matches!(err.0, DomainError::AuthenticationFailed));
    }

    #[tokio::test]
    async fn test_valid_signature_accepted() {
        use hmac::{Hmac, Mac};
        use sha2::Sha256;

        let state = app_state(Some("topsecret"));
        let id = calling_session(&state, "conv-1").await;

        let body = terminal_event("conv-1");
        let mut mac = Hmac::<Sha256>::new_from_slice(b"topsecret").unwrap();
        mac.update(&body);
        let signature = hex::encode(mac.finalize().into_bytes());

        let mut headers = HeaderMap::new();
        headers.insert(SIGNATURE_HEADER, signature.parse().unwrap());

        elevenlabs_webhook(State(state.clone()), headers, body)
            .await
            .unwrap();
        assert_eq!(
            state.store.get(id).await.unwrap().state(),
            SessionState::Completed
        );
    }

    #[tokio::test]
    async fn test_malformed_body_acked() {
        let state = app_state(None);
        let response = elevenlabs_webhook(
            State(state),
            HeaderMap::new(),
            Bytes::from_static(b"not json at all"),
        )
        .await
        .unwrap();
        assert_eq!(response.0["ok"], true);
    }

    #[test]
    fn test_envelope_alternate_field_names() {
        let envelope: WebhookEnvelope = serde_json::from_value(json!({
            "event_type": "call_ended",
            "data": {
                "id": "conv-alt",
                "audio_url": "https://example.com/rec.mp3",
                "call_status": "done",
            }
        }))
        .unwrap();

        assert_eq!(envelope.event_type(), "call_ended");
        assert_eq!(envelope.correlation_key(), Some("conv-alt"));
        let summary = envelope.summary("conv-alt");
        assert_eq!(
            summary.recording_url.as_deref(),
            Some("https://example.com/rec.mp3")
        );
        assert_eq!(summary.status.as_deref(), Some("done"));
        assert!(summary.transcript.is_none());
    }

    #[test]
    fn test_envelope_structured_transcript() {
        let envelope: WebhookEnvelope = serde_json::from_value(json!({
            "type": "post_call_transcription",
            "data": {
                "conversation_id": "conv-1",
                "transcript": [{"role": "agent", "message": "hi"}],
            }
        }))
        .unwrap();

        let summary = envelope.summary("conv-1");
        assert!(summary.transcript.unwrap().contains("agent"));
    }

    #[test]
    fn test_envelope_missing_fields_tolerated() {
        let envelope: WebhookEnvelope = serde_json::from_value(json!({})).unwrap();
        assert_eq!(envelope.event_type(), "unknown");
        assert!(envelope.correlation_key().is_none());
    }
}
