//! DialBridge - Chat-prepared outbound voice calls
//!
//! A user prepares a phone call with a chat assistant, triggers a real
//! outbound call through an external voice provider, and receives the
//! call result live once the provider's post-call webhook arrives.

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interface;

// Re-export commonly used types
pub use domain::shared::error::DomainError;
pub use domain::shared::result::Result;
