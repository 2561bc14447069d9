//! Scripted conversational agent.
//!
//! A [`Conversation`] owns the role-tagged history for one call or one chat
//! session; nothing here is shared process-wide. The chat backend sits
//! behind [`ChatProvider`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

pub mod openai_chat;
pub mod sessions;

pub use openai_chat::OpenAIChatProvider;
pub use sessions::ConversationStore;

/// Reply handed back when the chat backend fails. Callers receive it like
/// any other reply.
pub const AGENT_FAILURE_MESSAGE: &str = "Error generating AI response.";

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Agent is not configured: {0}")]
    NotConfigured(String),
}

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Chat completion backend.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Returns the next assistant turn for `messages`.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AgentError>;

    fn name(&self) -> &'static str;
}

/// Ordered history for one conversation, seeded once with the system prompt.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(system_prompt: &str) -> Self {
        let mut messages = Vec::new();
        if !system_prompt.trim().is_empty() {
            messages.push(ChatMessage::system(system_prompt));
        }
        Self { messages }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Appends `user_text`, asks `provider` for the next turn and appends the
    /// reply. On failure the user turn stays, nothing else is appended, and
    /// [`AGENT_FAILURE_MESSAGE`] is returned.
    pub async fn respond(&mut self, provider: &dyn ChatProvider, user_text: &str) -> String {
        self.messages.push(ChatMessage::user(user_text));
        debug!(
            "Requesting agent turn from {} with {} messages",
            provider.name(),
            self.messages.len()
        );

        match provider.complete(&self.messages).await {
            Ok(reply) => {
                self.messages.push(ChatMessage::assistant(reply.clone()));
                reply
            }
            Err(e) => {
                error!("AI response error: {}", e);
                AGENT_FAILURE_MESSAGE.to_string()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Replies with a fixed string and records every request it sees.
    #[derive(Default)]
    pub struct ScriptedProvider {
        pub reply: Option<String>,
        pub requests: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedProvider {
        pub fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl ChatProvider for ScriptedProvider {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AgentError> {
            self.requests.lock().unwrap().push(messages.to_vec());
            self.reply.clone().ok_or(AgentError::Api {
                status: 503,
                message: "unavailable".to_string(),
            })
        }

        fn name(&self) -> &'static str {
            "Scripted"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedProvider;
    use super::*;

    #[tokio::test]
    async fn test_conversation_seeded_with_system_prompt() {
        let conversation = Conversation::new("You are a telecaller.");
        assert_eq!(conversation.messages(), &[ChatMessage::system("You are a telecaller.")]);

        assert!(Conversation::new("  ").is_empty());
    }

    #[tokio::test]
    async fn test_respond_appends_both_turns() {
        let provider = ScriptedProvider::replying("Hello! How can I help?");
        let mut conversation = Conversation::new("prompt");

        let reply = conversation.respond(&provider, "Hi").await;
        assert_eq!(reply, "Hello! How can I help?");
        assert_eq!(
            conversation.messages(),
            &[
                ChatMessage::system("prompt"),
                ChatMessage::user("Hi"),
                ChatMessage::assistant("Hello! How can I help?"),
            ]
        );
    }

    #[tokio::test]
    async fn test_history_accumulates_across_turns() {
        let provider = ScriptedProvider::replying("ok");
        let mut conversation = Conversation::new("prompt");

        conversation.respond(&provider, "first").await;
        conversation.respond(&provider, "second").await;

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].len(), 2);
        // system, user, assistant, user
        assert_eq!(requests[1].len(), 4);
        assert_eq!(requests[1][3], ChatMessage::user("second"));
        assert_eq!(conversation.len(), 5);
    }

    #[tokio::test]
    async fn test_failure_returns_sentinel() {
        let provider = ScriptedProvider::failing();
        let mut conversation = Conversation::new("prompt");

        let reply = conversation.respond(&provider, "Hi").await;
        assert_eq!(reply, AGENT_FAILURE_MESSAGE);
        assert_eq!(
            conversation.messages(),
            &[ChatMessage::system("prompt"), ChatMessage::user("Hi")]
        );
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&ChatMessage::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }
}
