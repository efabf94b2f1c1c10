use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;

use crate::{Session, SessionKey, SessionStore};

/// Process-local store; sessions live until the process exits.
#[derive(Default)]
pub struct MemorySessionStore {
    by_key: DashMap<String, Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            by_key: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, key: &SessionKey) -> Result<Session> {
        Ok(self
            .by_key
            .entry(key.cache_key())
            .or_default()
            .value()
            .clone())
    }

    async fn save(&self, key: &SessionKey, session: Session) -> Result<()> {
        self.by_key.insert(key.cache_key(), session);
        Ok(())
    }

    async fn get(&self, key: &SessionKey) -> Result<Option<Session>> {
        Ok(self
            .by_key
            .get(&key.cache_key())
            .map(|entry| entry.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_creates_empty_session_once() {
        let store = MemorySessionStore::new();
        let key = SessionKey::new("chat", "user");
        assert!(store.get(&key).await.unwrap().is_none());

        let session = store.load(&key).await.unwrap();
        assert_eq!(session, Session::default());
        assert_eq!(store.len(), 1);
        assert!(store.get(&key).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn save_replaces_previous_state() {
        let store = MemorySessionStore::new();
        let key = SessionKey::new("chat", "user");
        let mut session = store.load(&key).await.unwrap();
        session.select_shop("demo");
        store.save(&key, session.clone()).await.unwrap();

        let reloaded = store.load(&key).await.unwrap();
        assert_eq!(reloaded.current_shop(), Some("demo"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn sessions_are_partitioned_by_user() {
        let store = MemorySessionStore::new();
        let alice = SessionKey::new("group", "alice");
        let bob = SessionKey::new("group", "bob");

        let mut session = store.load(&alice).await.unwrap();
        session.select_shop("demo");
        store.save(&alice, session).await.unwrap();

        let other = store.load(&bob).await.unwrap();
        assert_eq!(other.current_shop(), None);
        assert_eq!(store.len(), 2);
    }
}
