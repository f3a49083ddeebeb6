//! Domain layer - Core business logic and rules
//!
//! This layer contains:
//! - The session aggregate and its lifecycle state machine
//! - The session store (single writer of lifecycle transitions)
//! - The call correlator mapping provider conversations back to sessions
//! - External collaborator seams (chat completion)

pub mod chat;
pub mod correlation;
pub mod session;
pub mod shared;

// Re-export commonly used types
pub use shared::{DomainError, Result};
