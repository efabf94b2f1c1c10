mod memory;
mod state;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use memory::MemorySessionStore;
pub use state::{CheckoutError, CheckoutState, CompletedCheckout, Cursor, Phase, Session};

/// Shared session store handle used by the conversation controller.
pub type SharedSessionStore = Arc<dyn SessionStore>;

/// Identity of a shopper inside a chat, as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub chat_id: String,
    pub user_id: String,
}

impl SessionKey {
    pub fn new(chat_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            user_id: user_id.into(),
        }
    }

    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.chat_id, self.user_id)
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the session for `key`, creating an empty one on first contact.
    async fn load(&self, key: &SessionKey) -> Result<Session>;
    async fn save(&self, key: &SessionKey, session: Session) -> Result<()>;
    async fn get(&self, key: &SessionKey) -> Result<Option<Session>>;
}

/// Returns an in-memory session store wrapped in an [`Arc`].
pub fn shared_memory_store() -> SharedSessionStore {
    Arc::new(MemorySessionStore::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_joins_chat_and_user() {
        let key = SessionKey::new("-100", "7");
        assert_eq!(key.cache_key(), "-100:7");
    }
}
