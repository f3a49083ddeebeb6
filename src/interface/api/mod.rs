//! API interface implementations

pub mod calls_handler;
pub mod dto;
pub mod router;
pub mod session_handler;
pub mod sse;
pub mod webhook_handler;

pub use router::build_router;
pub use session_handler::AppState;
pub use sse::{EventBroadcaster, LiveEvent};
