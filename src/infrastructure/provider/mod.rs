//! Voice-call provider integration

pub mod client;
pub mod signature;

pub use client::{CallProvider, ConversationDetail, ElevenLabsClient, OutboundCallHandle};
pub use signature::verify_signature;

/// Coerce a loosely typed provider field into display text.
///
/// Provider payloads are parsed defensively: a transcript may arrive as a
/// plain string or as structured turns; anything else is serialized as-is.
pub fn text_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => serde_json::to_string(other).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_value() {
        assert_eq!(text_value(&json!(null)), None);
        assert_eq!(text_value(&json!("hello")), Some("hello".to_string()));
        assert_eq!(
            text_value(&json!([{"role": "agent", "text": "hi"}])),
            Some(r#"[{"role":"agent","text":"hi"}]"#.to_string())
        );
    }
}
