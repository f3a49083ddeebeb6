//! Session aggregate root
//!
//! A session is one chat/call-preparation workflow: the user chats with an
//! assistant, finalizes a call plan, triggers the outbound call and waits
//! for the provider's terminal event. The aggregate enforces the lifecycle
//! state machine; all mutation goes through it.

use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session lifecycle state
///
/// Transitions are strictly forward:
/// Drafting → Chatting → Finalized → Calling → Completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Session exists, no messages yet
    Drafting,
    /// Messages exchanged, no call triggered
    Chatting,
    /// Call plan produced, chat input frozen
    Finalized,
    /// Outbound call triggered, attempt pending
    Calling,
    /// Terminal event resolved and applied
    Completed,
}

impl SessionState {
    pub fn as_str(&self) -> &str {
        match self {
            SessionState::Drafting => "drafting",
            SessionState::Chatting => "chatting",
            SessionState::Finalized => "finalized",
            SessionState::Calling => "calling",
            SessionState::Completed => "completed",
        }
    }

    /// Chat history is frozen from Finalized onward.
    pub fn is_frozen(&self) -> bool {
        matches!(
            self,
            SessionState::Finalized | SessionState::Calling | SessionState::Completed
        )
    }
}

/// Message author role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// A single chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: MessageRole, content: String) -> Self {
        Self {
            role,
            content,
            timestamp: Utc::now(),
        }
    }
}

/// Call-parameter artifact produced at finalize time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallPlan {
    pub to_number: String,
    pub prompt: String,
    pub username: Option<String>,
}

/// Result artifact applied when the terminal event resolves
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSummary {
    pub conversation_id: String,
    pub transcript: Option<String>,
    pub recording_url: Option<String>,
    pub status: Option<String>,
}

impl CallSummary {
    /// Human-readable summary text pushed to live subscribers.
    pub fn render(&self) -> String {
        match (&self.transcript, &self.status) {
            (Some(transcript), _) => transcript.clone(),
            (None, Some(status)) => format!("Call ended with status: {}", status),
            (None, None) => "Call ended".to_string(),
        }
    }
}

/// Session aggregate root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    id: Uuid,
    name: String,
    messages: Vec<Message>,
    state: SessionState,
    call_plan: Option<CallPlan>,
    /// Correlation key of the pending call attempt, if any
    active_attempt: Option<String>,
    summary: Option<CallSummary>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session in the Drafting state
    pub fn new(name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            messages: Vec::new(),
            state: SessionState::Drafting,
            call_plan: None,
            active_attempt: None,
            summary: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn call_plan(&self) -> Option<&CallPlan> {
        self.call_plan.as_ref()
    }

    pub fn active_attempt(&self) -> Option<&str> {
        self.active_attempt.as_deref()
    }

    pub fn summary(&self) -> Option<&CallSummary> {
        self.summary.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Append a chat message
    ///
    /// The first message moves the session to Chatting. Fails once the
    /// history is frozen (Finalized or beyond).
    pub fn append_message(&mut self, role: MessageRole, content: String) -> Result<()> {
        match self.state {
            SessionState::Drafting => self.transition_to(SessionState::Chatting)?,
            SessionState::Chatting => {}
            _ => {
                return Err(DomainError::InvalidState(format!(
                    "cannot append messages in state {}",
                    self.state.as_str()
                )))
            }
        }
        self.messages.push(Message::new(role, content));
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Finalize the session, freezing chat and storing the call plan
    pub fn finalize(&mut self, plan: CallPlan) -> Result<()> {
        self.transition_to(SessionState::Finalized)?;
        self.call_plan = Some(plan);
        Ok(())
    }

    /// Reserve the session for an outbound call
    ///
    /// Returns the stored call plan. The correlation key is attached later,
    /// once the provider has returned it.
    pub fn begin_call(&mut self) -> Result<CallPlan> {
        if self.state == SessionState::Calling {
            return Err(DomainError::AttemptInProgress(self.id.to_string()));
        }
        self.transition_to(SessionState::Calling)?;
        self.call_plan
            .clone()
            .ok_or_else(|| DomainError::Internal("finalized session without call plan".to_string()))
    }

    /// Attach the provider's correlation key to the pending attempt
    pub fn attach_attempt(&mut self, correlation_key: String) -> Result<()> {
        if self.state != SessionState::Calling {
            return Err(DomainError::InvalidState(format!(
                "cannot attach attempt in state {}",
                self.state.as_str()
            )));
        }
        self.active_attempt = Some(correlation_key);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Roll the session back out of Calling after a failed trigger
    ///
    /// A failed trigger must not leave the session in Calling without a
    /// genuinely pending attempt.
    pub fn clear_call(&mut self) -> Result<()> {
        if self.state != SessionState::Calling {
            return Err(DomainError::InvalidState(format!(
                "cannot clear call in state {}",
                self.state.as_str()
            )));
        }
        self.state = SessionState::Finalized;
        self.active_attempt = None;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Apply the terminal-event summary, completing the session
    ///
    /// Only a resolved webhook may reach Completed.
    pub fn complete(&mut self, summary: CallSummary) -> Result<()> {
        self.transition_to(SessionState::Completed)?;
        self.active_attempt = None;
        self.summary = Some(summary);
        Ok(())
    }

    /// Enforce the forward-only state machine
    fn transition_to(&mut self, next: SessionState) -> Result<()> {
        use SessionState::*;
        let allowed = matches!(
            (self.state, next),
            (Drafting, Chatting) | (Chatting, Finalized) | (Finalized, Calling) | (Calling, Completed)
        );
        if !allowed {
            return Err(DomainError::InvalidState(format!(
                "cannot transition from {} to {}",
                self.state.as_str(),
                next.as_str()
            )));
        }
        self.state = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}
