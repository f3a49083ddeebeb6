//! Session bounded context - chat/call-preparation workflow instances

pub mod entity;
pub mod store;

pub use entity::{CallPlan, CallSummary, Message, MessageRole, Session, SessionState};
pub use store::SessionStore;
