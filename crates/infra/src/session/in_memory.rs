use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use warden_login::{SessionStore, StoreError};

/// Opaque session identifier (what a host puts in its session cookie).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for SessionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

type Sessions = HashMap<SessionId, HashMap<String, String>>;

/// In-memory session storage shared by all callers of one application instance.
///
/// Intended for tests/dev: nothing expires and nothing is persisted.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<Sessions>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume the session named by a client-supplied id, or hand out a new one when
    /// the id is absent or unknown.
    ///
    /// A new session is not stored until its first write, so requests that never
    /// write leave nothing behind.
    pub fn open(&self, id: Option<&str>) -> Result<MemorySession, StoreError> {
        let sessions = self.sessions.read().map_err(|_| StoreError::LockPoisoned)?;

        if let Some(id) = id.map(|raw| SessionId(raw.to_string())) {
            if sessions.contains_key(&id) {
                return Ok(MemorySession {
                    id,
                    fresh: false,
                    sessions: Arc::clone(&self.sessions),
                });
            }
        }

        Ok(MemorySession {
            id: SessionId::new(),
            fresh: true,
            sessions: Arc::clone(&self.sessions),
        })
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One caller's view of [`InMemorySessionStore`].
#[derive(Debug, Clone)]
pub struct MemorySession {
    id: SessionId,
    fresh: bool,
    sessions: Arc<RwLock<Sessions>>,
}

impl MemorySession {
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Whether the session was created for this request.
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    /// Whether anything has been written under this id.
    pub fn is_stored(&self) -> bool {
        self.sessions
            .read()
            .map(|sessions| sessions.contains_key(&self.id))
            .unwrap_or(false)
    }

    /// Fresh and written to: the host must hand the id to the client.
    pub fn needs_cookie(&self) -> bool {
        self.fresh && self.is_stored()
    }
}

#[async_trait]
impl SessionStore for MemorySession {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let sessions = self.sessions.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(sessions.get(&self.id).and_then(|values| values.get(key).cloned()))
    }

    async fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().map_err(|_| StoreError::LockPoisoned)?;
        let values = sessions.entry(self.id.clone()).or_insert_with(|| {
            tracing::debug!(session = %self.id, "session started");
            HashMap::new()
        });
        values.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&mut self, key: &str) -> Result<Option<String>, StoreError> {
        let mut sessions = self.sessions.write().map_err(|_| StoreError::LockPoisoned)?;
        Ok(sessions.get_mut(&self.id).and_then(|values| values.remove(key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn values_are_scoped_to_one_session() {
        let store = InMemorySessionStore::new();
        let mut alice = store.open(None).unwrap();
        let bob = store.open(None).unwrap();

        alice.set("return_to", "/reports".to_string()).await.unwrap();

        assert_eq!(alice.get("return_to").await.unwrap().as_deref(), Some("/reports"));
        assert_eq!(bob.get("return_to").await.unwrap(), None);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn reopen_by_id_sees_previous_writes() {
        let store = InMemorySessionStore::new();
        let mut first = store.open(None).unwrap();
        assert!(first.is_fresh());
        first.set("app", "42".to_string()).await.unwrap();

        let mut again = store.open(Some(first.id().as_str())).unwrap();
        assert!(!again.is_fresh());
        assert_eq!(again.get("app").await.unwrap().as_deref(), Some("42"));

        assert_eq!(again.delete("app").await.unwrap().as_deref(), Some("42"));
        assert_eq!(first.get("app").await.unwrap(), None);
    }

    #[tokio::test]
    async fn sessions_are_stored_on_first_write_only() {
        let store = InMemorySessionStore::new();
        for _ in 0..10 {
            let session = store.open(None).unwrap();
            assert_eq!(session.get("app").await.unwrap(), None);
            assert!(!session.needs_cookie());
        }
        assert!(store.is_empty());

        let mut session = store.open(None).unwrap();
        assert_eq!(session.delete("return_to").await.unwrap(), None);
        assert!(store.is_empty());

        session.set("return_to", "/reports".to_string()).await.unwrap();
        assert!(session.needs_cookie());
        assert_eq!(store.len(), 1);

        let again = store.open(Some(session.id().as_str())).unwrap();
        assert!(again.is_stored());
        assert!(!again.needs_cookie());
    }

    #[tokio::test]
    async fn unknown_id_starts_a_new_session() {
        let store = InMemorySessionStore::new();
        let session = store.open(Some("forged")).unwrap();
        assert!(session.is_fresh());
        assert_ne!(session.id().as_str(), "forged");
    }
}
