//! ElevenLabs Conversational AI client
//!
//! Places outbound calls through the Twilio-backed convai endpoint and
//! fetches conversation transcripts. The provider accepts a trigger and
//! later delivers one terminal event through the webhook; the conversation
//! id returned here is the correlation key echoed back in that event.

use crate::config::ProviderConfig;
use crate::domain::session::entity::CallPlan;
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

/// Provider acknowledgment of an outbound-call trigger
#[derive(Debug, Clone)]
pub struct OutboundCallHandle {
    /// Correlation key the provider echoes in its terminal event
    pub conversation_id: String,
    pub call_sid: Option<String>,
}

/// Read-only transcript/recording view of a conversation
#[derive(Debug, Clone)]
pub struct ConversationDetail {
    pub conversation_id: String,
    pub transcript: Option<String>,
    pub recording_url: Option<String>,
}

/// Opaque call provider: accepts a trigger, later delivers one terminal event.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CallProvider: Send + Sync {
    async fn start_outbound_call(&self, plan: &CallPlan) -> Result<OutboundCallHandle>;

    async fn fetch_conversation(&self, conversation_id: &str) -> Result<ConversationDetail>;
}

pub struct ElevenLabsClient {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl ElevenLabsClient {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }
}

#[async_trait]
impl CallProvider for ElevenLabsClient {
    async fn start_outbound_call(&self, plan: &CallPlan) -> Result<OutboundCallHandle> {
        if !self.config.is_configured() {
            return Err(DomainError::NotConfigured(
                "Missing ELEVENLABS_API_KEY or ELEVENLABS_AGENT_ID".to_string(),
            ));
        }

        let url = format!("{}/v1/convai/twilio/outbound-call", self.config.base_url);
        let payload = outbound_payload(&self.config, plan);

        info!("Initiating outbound call to {}", plan.to_number);
        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.config.api_key)
            .timeout(self.timeout())
            .json(&payload)
            .send()
            .await
            .map_err(|e| DomainError::Provider(format!("outbound call request failed: {}", e)))?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            warn!("ElevenLabs call failed: {} - {}", status, body);
            return Err(DomainError::Provider(format!(
                "provider returned {}: {}",
                status, body
            )));
        }

        let conversation_id = body
            .get("conversation_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                DomainError::Provider("provider response missing conversation_id".to_string())
            })?;
        let call_sid = body
            .get("callSid")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(OutboundCallHandle {
            conversation_id,
            call_sid,
        })
    }

    async fn fetch_conversation(&self, conversation_id: &str) -> Result<ConversationDetail> {
        if self.config.api_key.is_empty() {
            return Err(DomainError::NotConfigured(
                "Missing ELEVENLABS_API_KEY".to_string(),
            ));
        }

        let url = format!(
            "{}/v1/convai/conversations/{}",
            self.config.base_url, conversation_id
        );
        let response = self
            .client
            .get(&url)
            .header("xi-api-key", &self.config.api_key)
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| DomainError::Provider(format!("conversation request failed: {}", e)))?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            return Err(DomainError::Provider(format!(
                "provider returned {}: {}",
                status, body
            )));
        }

        Ok(ConversationDetail {
            conversation_id: conversation_id.to_string(),
            transcript: body.get("transcript").and_then(super::text_value),
            recording_url: body
                .get("recording_url")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

/// Build the outbound-call request body.
///
/// The call purpose and username travel as dynamic variables the agent can
/// reference mid-call. Phone routing prefers a provider-managed number id
/// over a raw from-number.
fn outbound_payload(config: &ProviderConfig, plan: &CallPlan) -> Value {
    let mut payload = json!({
        "agent_id": config.agent_id,
        "to_number": plan.to_number,
        "conversation_initiation_client_data": {
            "type": "conversation_initiation_client_data",
            "dynamic_variables": {
                "purpose": plan.prompt,
                "username": plan.username,
            }
        }
    });

    if !config.agent_phone_number_id.is_empty() {
        payload["agent_phone_number_id"] = json!(config.agent_phone_number_id);
    } else if !config.from_number.is_empty() {
        payload["from_number"] = json!(config.from_number);
    }

    payload
}
