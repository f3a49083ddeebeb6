//! Interface layer - External interfaces
//!
//! This layer handles:
//! - REST API endpoints
//! - Webhook ingest
//! - Server-Sent Events live updates

pub mod api;
