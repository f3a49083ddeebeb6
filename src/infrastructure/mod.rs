//! Infrastructure layer - Technical implementations
//!
//! External service integrations: the voice-call provider client and
//! webhook signature verification.

pub mod provider;
