//! Domain errors

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Call attempt already in progress: {0}")]
    AttemptInProgress(String),

    #[error("Correlation key already registered: {0}")]
    DuplicateKey(String),

    #[error("Correlation key already resolved: {0}")]
    AlreadyResolved(String),

    #[error("Webhook signature verification failed")]
    AuthenticationFailed,

    #[error("Call provider error: {0}")]
    Provider(String),

    #[error("Server not configured: {0}")]
    NotConfigured(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
