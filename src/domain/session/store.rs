//! In-memory session registry
//!
//! The store owns every session for the lifetime of the process. The outer
//! map lock is held only long enough to look up or insert an entry; each
//! session has its own lock, so mutations on different ids never contend
//! while mutations on the same id are fully serialized.

use crate::domain::session::entity::{CallPlan, CallSummary, MessageRole, Session, SessionState};
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<RwLock<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new session in the Drafting state
    pub async fn create(&self, name: String) -> Session {
        let session = Session::new(name);
        let snapshot = session.clone();
        self.sessions
            .write()
            .await
            .insert(session.id(), Arc::new(RwLock::new(session)));
        snapshot
    }

    /// Fetch a snapshot of a session
    pub async fn get(&self, id: Uuid) -> Result<Session> {
        let entry = self.entry(id).await?;
        let session = entry.read().await;
        Ok(session.clone())
    }

    /// List snapshots of all sessions, newest first
    pub async fn list(&self) -> Vec<Session> {
        let entries: Vec<_> = self.sessions.read().await.values().cloned().collect();
        let mut sessions = Vec::with_capacity(entries.len());
        for entry in entries {
            sessions.push(entry.read().await.clone());
        }
        sessions.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        sessions
    }

    /// Append a message, returning the updated snapshot
    pub async fn append_message(
        &self,
        id: Uuid,
        role: MessageRole,
        content: String,
    ) -> Result<Session> {
        let entry = self.entry(id).await?;
        let mut session = entry.write().await;
        session.append_message(role, content)?;
        Ok(session.clone())
    }

    /// Finalize a session with its call plan
    pub async fn finalize(&self, id: Uuid, plan: CallPlan) -> Result<Session> {
        let entry = self.entry(id).await?;
        let mut session = entry.write().await;
        session.finalize(plan)?;
        Ok(session.clone())
    }

    /// Reserve the session for an outbound call and return its plan
    ///
    /// Holding the per-session write lock across the state check makes
    /// concurrent triggers on the same session lose with AttemptInProgress.
    pub async fn begin_call(&self, id: Uuid) -> Result<CallPlan> {
        let entry = self.entry(id).await?;
        let mut session = entry.write().await;
        session.begin_call()
    }

    /// Record the provider-assigned correlation key on a reserved session
    pub async fn attach_attempt(&self, id: Uuid, correlation_key: String) -> Result<()> {
        let entry = self.entry(id).await?;
        let mut session = entry.write().await;
        session.attach_attempt(correlation_key)
    }

    /// Roll a session back out of Calling after a failed trigger
    pub async fn clear_call(&self, id: Uuid) -> Result<()> {
        let entry = self.entry(id).await?;
        let mut session = entry.write().await;
        session.clear_call()
    }

    /// Apply the terminal-event summary, completing the session
    pub async fn complete(&self, id: Uuid, summary: CallSummary) -> Result<Session> {
        let entry = self.entry(id).await?;
        let mut session = entry.write().await;
        session.complete(summary)?;
        Ok(session.clone())
    }

    /// Remove a session
    ///
    /// Returns the correlation key of a still-pending attempt so the caller
    /// can abandon it in the correlator.
    pub async fn delete(&self, id: Uuid) -> Result<Option<String>> {
        let entry = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| DomainError::NotFound(format!("session {}", id)))?;
        let session = entry.read().await;
        if session.state() == SessionState::Calling {
            Ok(session.active_attempt().map(str::to_string))
        } else {
            Ok(None)
        }
    }

    async fn entry(&self, id: Uuid) -> Result<Arc<RwLock<Session>>> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::NotFound(format!("session {}", id)))
    }
}
