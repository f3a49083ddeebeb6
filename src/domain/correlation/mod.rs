//! Call correlation
//!
//! The provider has no notion of sessions; it only echoes back the
//! conversation id it handed out at trigger time. The correlator is the
//! single source of truth translating that provider-scoped key into the
//! owning session, and it makes resolution idempotent so provider retries
//! never re-trigger downstream effects.

use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Call attempt status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptStatus {
    /// Waiting for the provider's terminal event
    Pending,
    /// Terminal event received and applied
    Resolved,
    /// Session deleted (or cleanup) before the terminal event arrived
    Abandoned,
}

/// A single outstanding or settled outbound-call trigger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallAttempt {
    pub correlation_key: String,
    pub session_id: Uuid,
    pub status: AttemptStatus,
    pub created_at: DateTime<Utc>,
}

impl CallAttempt {
    fn new(correlation_key: String, session_id: Uuid) -> Self {
        Self {
            correlation_key,
            session_id,
            status: AttemptStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// Maps in-flight call attempts to the sessions that initiated them
#[derive(Default)]
pub struct Correlator {
    attempts: Mutex<HashMap<String, CallAttempt>>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pending attempt under the provider's correlation key
    ///
    /// Fails with DuplicateKey if the key is already pending, and with
    /// AttemptInProgress if the session already has any pending attempt.
    /// A settled (resolved/abandoned) entry under the same key is replaced;
    /// the provider owns key uniqueness, so a reused key means the old
    /// entry is stale.
    pub async fn register(&self, correlation_key: &str, session_id: Uuid) -> Result<CallAttempt> {
        let mut attempts = self.attempts.lock().await;

        if let Some(existing) = attempts.get(correlation_key) {
            if existing.status == AttemptStatus::Pending {
                return Err(DomainError::DuplicateKey(correlation_key.to_string()));
            }
        }
        if attempts
            .values()
            .any(|a| a.session_id == session_id && a.status == AttemptStatus::Pending)
        {
            return Err(DomainError::AttemptInProgress(session_id.to_string()));
        }

        let attempt = CallAttempt::new(correlation_key.to_string(), session_id);
        attempts.insert(correlation_key.to_string(), attempt.clone());
        Ok(attempt)
    }

    /// Resolve a terminal event to the owning session, exactly once
    ///
    /// A second event with the same key returns AlreadyResolved; an event
    /// for an abandoned attempt (deleted session) is treated as NotFound.
    pub async fn resolve(&self, correlation_key: &str) -> Result<Uuid> {
        let mut attempts = self.attempts.lock().await;
        let attempt = attempts
            .get_mut(correlation_key)
            .ok_or_else(|| DomainError::NotFound(format!("attempt {}", correlation_key)))?;

        match attempt.status {
            AttemptStatus::Pending => {
                attempt.status = AttemptStatus::Resolved;
                Ok(attempt.session_id)
            }
            AttemptStatus::Resolved => {
                Err(DomainError::AlreadyResolved(correlation_key.to_string()))
            }
            AttemptStatus::Abandoned => {
                Err(DomainError::NotFound(format!("attempt {}", correlation_key)))
            }
        }
    }

    /// Abandon a pending attempt without resolving it
    ///
    /// No-op on unknown or already settled keys.
    pub async fn abandon(&self, correlation_key: &str) {
        let mut attempts = self.attempts.lock().await;
        if let Some(attempt) = attempts.get_mut(correlation_key) {
            if attempt.status == AttemptStatus::Pending {
                attempt.status = AttemptStatus::Abandoned;
            }
        }
    }

    /// Drop a pending attempt entirely (trigger rollback)
    pub async fn unregister(&self, correlation_key: &str) {
        let mut attempts = self.attempts.lock().await;
        if let Some(attempt) = attempts.get(correlation_key) {
            if attempt.status == AttemptStatus::Pending {
                attempts.remove(correlation_key);
            }
        }
    }

    /// Correlation key of the session's pending attempt, if any
    pub async fn pending_for_session(&self, session_id: Uuid) -> Option<String> {
        let attempts = self.attempts.lock().await;
        attempts
            .values()
            .find(|a| a.session_id == session_id && a.status == AttemptStatus::Pending)
            .map(|a| a.correlation_key.clone())
    }

    /// Look up an attempt by key
    pub async fn get(&self, correlation_key: &str) -> Option<CallAttempt> {
        self.attempts.lock().await.get(correlation_key).cloned()
    }
}
