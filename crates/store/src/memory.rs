//! In-memory session store backed by a `HashMap` behind an `RwLock`.

use async_trait::async_trait;
use canvasgate_types::{BoundSession, Result, SessionId, SessionStore};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// An in-memory [`SessionStore`].
///
/// Resolution takes a read lock only, so concurrent requests on the same or
/// different sessions never wait on each other except during login/logout.
pub struct InMemorySessionStore {
    data: RwLock<HashMap<SessionId, BoundSession>>,
}

impl InMemorySessionStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, id: &SessionId, session: BoundSession) -> Result<()> {
        self.data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), session);
        Ok(())
    }

    async fn get(&self, id: &SessionId) -> Result<Option<BoundSession>> {
        Ok(self
            .data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned())
    }

    async fn remove(&self, id: &SessionId) -> Result<Option<BoundSession>> {
        Ok(self
            .data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.data.read().unwrap_or_else(PoisonError::into_inner).len())
    }

    async fn retain(
        &self,
        keep: &(dyn for<'a> Fn(&'a BoundSession) -> bool + Sync),
    ) -> Result<usize> {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        let before = data.len();
        data.retain(|_, session| keep(session));
        let dropped = before - data.len();
        if dropped > 0 {
            tracing::debug!(dropped, remaining = data.len(), "swept sessions");
        }
        Ok(dropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvasgate_types::AccessToken;
    use std::sync::Arc;

    fn session(token: &str, expires_at: Option<u64>) -> BoundSession {
        BoundSession {
            token: Arc::new(AccessToken::new(token)),
            created_at: 0,
            expires_at,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = InMemorySessionStore::new();
        let id = SessionId::generate();
        store.insert(&id, session("t1", None)).await.unwrap();
        let got = store.get(&id).await.unwrap().unwrap();
        assert_eq!(got.token.expose(), "t1");
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = InMemorySessionStore::new();
        assert!(store.get(&SessionId::generate()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove() {
        let store = InMemorySessionStore::new();
        let id = SessionId::generate();
        store.insert(&id, session("t", None)).await.unwrap();
        assert!(store.remove(&id).await.unwrap().is_some());
        assert!(store.get(&id).await.unwrap().is_none());
        assert!(store.remove(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sessions_are_disjoint() {
        let store = InMemorySessionStore::new();
        let a = SessionId::generate();
        let b = SessionId::generate();
        store.insert(&a, session("alice", None)).await.unwrap();
        store.insert(&b, session("bob", None)).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
        assert_eq!(store.get(&a).await.unwrap().unwrap().token.expose(), "alice");
        assert_eq!(store.get(&b).await.unwrap().unwrap().token.expose(), "bob");
    }

    #[tokio::test]
    async fn test_retain_drops_rejected() {
        let store = InMemorySessionStore::new();
        let live = SessionId::generate();
        let dead = SessionId::generate();
        store.insert(&live, session("a", Some(500))).await.unwrap();
        store.insert(&dead, session("b", Some(50))).await.unwrap();
        let dropped = store
            .retain(&|s: &BoundSession| s.is_live_at(100, true))
            .await
            .unwrap();
        assert_eq!(dropped, 1);
        assert!(store.get(&live).await.unwrap().is_some());
        assert!(store.get(&dead).await.unwrap().is_none());
    }
}
