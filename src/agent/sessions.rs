//! Per-session conversations for the text chat endpoint.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use super::Conversation;

struct Session {
    conversation: Arc<Mutex<Conversation>>,
    last_activity: Instant,
}

/// Conversations keyed by session id. Each conversation has its own lock, so
/// turns within one session are serialized and sessions never share history.
#[derive(Clone)]
pub struct ConversationStore {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
    system_prompt: Arc<str>,
    max_sessions: usize,
}

impl ConversationStore {
    pub fn new(system_prompt: impl Into<String>, max_sessions: usize) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            system_prompt: Arc::from(system_prompt.into()),
            max_sessions: max_sessions.max(1),
        }
    }

    /// A fresh conversation not tracked by the store.
    pub fn fresh(&self) -> Conversation {
        Conversation::new(&self.system_prompt)
    }

    /// Returns the conversation for `session_id`, creating it when the id is
    /// absent or unknown. The id actually used is returned alongside.
    pub async fn session(&self, session_id: Option<&str>) -> (String, Arc<Mutex<Conversation>>) {
        let id = session_id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut sessions = self.sessions.lock().await;

        if let Some(session) = sessions.get_mut(&id) {
            session.last_activity = Instant::now();
            return (id, session.conversation.clone());
        }

        if sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, s)| s.last_activity)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                debug!("Evicting idle conversation {}", oldest);
                sessions.remove(&oldest);
            }
        }

        let conversation = Arc::new(Mutex::new(self.fresh()));
        sessions.insert(
            id.clone(),
            Session {
                conversation: conversation.clone(),
                last_activity: Instant::now(),
            },
        );
        info!("Started conversation session {}", id);

        (id, conversation)
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::ScriptedProvider;

    #[tokio::test]
    async fn test_new_session_gets_generated_id() {
        let store = ConversationStore::new("prompt", 10);
        let (id, conversation) = store.session(None).await;

        assert!(!id.is_empty());
        assert_eq!(conversation.lock().await.len(), 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_same_id_returns_same_history() {
        let store = ConversationStore::new("prompt", 10);
        let provider = ScriptedProvider::replying("ok");

        let (id, conversation) = store.session(Some("abc")).await;
        assert_eq!(id, "abc");
        conversation.lock().await.respond(&provider, "hello").await;

        let (_, again) = store.session(Some("abc")).await;
        assert_eq!(again.lock().await.len(), 3);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = ConversationStore::new("prompt", 10);
        let provider = ScriptedProvider::replying("ok");

        let (_, first) = store.session(Some("a")).await;
        first.lock().await.respond(&provider, "from a").await;

        let (_, second) = store.session(Some("b")).await;
        assert_eq!(second.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_evicts_least_recent_when_full() {
        let store = ConversationStore::new("prompt", 2);
        store.session(Some("a")).await;
        store.session(Some("b")).await;
        // Touch "a" so "b" becomes the oldest
        store.session(Some("a")).await;
        store.session(Some("c")).await;

        assert_eq!(store.len().await, 2);
        let sessions = store.sessions.lock().await;
        assert!(sessions.contains_key("a"));
        assert!(sessions.contains_key("c"));
        assert!(!sessions.contains_key("b"));
    }

    #[test]
    fn test_fresh_is_seeded() {
        let store = ConversationStore::new("prompt", 1);
        assert_eq!(store.fresh().len(), 1);
    }
}
