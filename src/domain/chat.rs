//! Chat completion seam
//!
//! Response generation is an external collaborator; the session handlers
//! only depend on this trait.

use crate::domain::session::entity::{Message, MessageRole};
use crate::domain::shared::result::Result;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Produce the assistant's next reply from the conversation history.
    async fn complete(&self, messages: &[Message]) -> Result<String>;
}

/// Deterministic fallback used when no language model is wired in.
pub struct ScriptedChat;

#[async_trait]
impl ChatCompletion for ScriptedChat {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        Ok(format!(
            "Noted: \"{}\". Finalize the session with a phone number and call purpose when you are ready.",
            last_user
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_chat_echoes_last_user_message() {
        let chat = ScriptedChat;
        let messages = vec![
            Message::new(MessageRole::User, "book a table".to_string()),
            Message::new(MessageRole::Assistant, "for how many?".to_string()),
            Message::new(MessageRole::User, "two people".to_string()),
        ];

        let reply = chat.complete(&messages).await.unwrap();
        assert!(reply.contains("two people"));
    }

    #[tokio::test]
    async fn test_scripted_chat_empty_history() {
        let chat = ScriptedChat;
        let reply = chat.complete(&[]).await.unwrap();
        assert!(!reply.is_empty());
    }
}
