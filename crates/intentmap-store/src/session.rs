use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use intentmap_core::SessionId;

use crate::storage::SessionStorage;

/// Inactivity window after which a persisted session is discarded.
pub const SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// The durable storage record: exactly `{"id": ..., "lastActivity": ...}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedSession {
    id: String,
    last_activity: i64,
}

/// Owns the renewable session identifier for one origin.
///
/// The id is minted lazily on first use and cached for the lifetime of this
/// store; expiry applies only when resuming a persisted session, never to the
/// in-memory id. Storage failures and corrupt records fail open — the caller
/// always gets a usable id and never an error.
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    origin: String,
    ttl_ms: i64,
    current: Mutex<Option<SessionId>>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionStorage>, origin: impl Into<String>) -> Self {
        Self::with_ttl(storage, origin, SESSION_TTL)
    }

    /// Same as [`new`](Self::new) with an explicit inactivity window.
    pub fn with_ttl(
        storage: Arc<dyn SessionStorage>,
        origin: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            storage,
            origin: origin.into(),
            ttl_ms: ttl.as_millis() as i64,
            current: Mutex::new(None),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The current session id: cached, resumed from storage if still within
    /// the inactivity window, or freshly minted.
    pub fn session_id(&self) -> SessionId {
        let mut current = self.current.lock();
        if let Some(id) = current.as_ref() {
            return id.clone();
        }

        let now = intentmap_core::now_millis();
        if let Some(id) = self.resume_persisted(now) {
            *current = Some(id.clone());
            return id;
        }

        let id = SessionId::new();
        debug!(origin = %self.origin, session_id = %id, "minted new session");
        self.persist(&id, now);
        *current = Some(id.clone());
        id
    }

    /// Rewrite the persisted `lastActivity` to now for the current id.
    /// No-op until a session has been minted or resumed.
    pub fn touch(&self) {
        let current = self.current.lock();
        if let Some(id) = current.as_ref() {
            self.persist(id, intentmap_core::now_millis());
        }
    }

    fn resume_persisted(&self, now: i64) -> Option<SessionId> {
        let raw = match self.storage.load(&self.origin) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                debug!(origin = %self.origin, error = %e, "session load failed, minting new");
                return None;
            }
        };

        // A record we cannot parse is treated as absent.
        let persisted: PersistedSession = match serde_json::from_str(&raw) {
            Ok(p) => p,
            Err(e) => {
                debug!(origin = %self.origin, error = %e, "corrupt session record, minting new");
                return None;
            }
        };

        if now.saturating_sub(persisted.last_activity) < self.ttl_ms {
            let id = SessionId::from_raw(persisted.id);
            debug!(origin = %self.origin, session_id = %id, "resumed persisted session");
            self.persist(&id, now);
            Some(id)
        } else {
            None
        }
    }

    fn persist(&self, id: &SessionId, now: i64) {
        let record = PersistedSession {
            id: id.as_str().to_string(),
            last_activity: now,
        };
        let json = match serde_json::to_string(&record) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to serialize session record");
                return;
            }
        };
        if let Err(e) = self.storage.store(&self.origin, &json) {
            debug!(origin = %self.origin, error = %e, "session persist failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::memory::MemoryStorage;

    const ORIGIN: &str = "https://example.com";

    fn store_with(storage: Arc<dyn SessionStorage>) -> SessionStore {
        SessionStore::new(storage, ORIGIN)
    }

    #[test]
    fn mints_on_first_use_and_caches() {
        let store = store_with(Arc::new(MemoryStorage::new()));
        let a = store.session_id();
        let b = store.session_id();
        assert_eq!(a, b);
        assert!(a.as_str().starts_with("sess_"));
    }

    #[test]
    fn persists_on_mint() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(storage.clone());
        let id = store.session_id();

        let raw = storage.load(ORIGIN).unwrap().unwrap();
        let persisted: PersistedSession = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted.id, id.as_str());
        assert!(persisted.last_activity > 0);
    }

    #[test]
    fn resumes_within_ttl() {
        let storage = Arc::new(MemoryStorage::new());
        let first = store_with(storage.clone()).session_id();

        // A fresh store (new process) adopts the persisted id
        let second = store_with(storage).session_id();
        assert_eq!(first, second);
    }

    #[test]
    fn rotates_after_ttl() {
        let storage = Arc::new(MemoryStorage::new());
        let first = store_with(storage.clone()).session_id();

        std::thread::sleep(Duration::from_millis(30));
        let expired =
            SessionStore::with_ttl(storage, ORIGIN, Duration::from_millis(10));
        let second = expired.session_id();
        assert_ne!(first, second);
    }

    #[test]
    fn touch_rewrites_last_activity() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(storage.clone());
        let _ = store.session_id();

        let before: PersistedSession =
            serde_json::from_str(&storage.load(ORIGIN).unwrap().unwrap()).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        store.touch();
        let after: PersistedSession =
            serde_json::from_str(&storage.load(ORIGIN).unwrap().unwrap()).unwrap();

        assert_eq!(before.id, after.id);
        assert!(after.last_activity > before.last_activity);
    }

    #[test]
    fn touch_before_first_use_is_noop() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(storage.clone());
        store.touch();
        assert_eq!(storage.load(ORIGIN).unwrap(), None);
    }

    #[test]
    fn corrupt_record_fails_open() {
        let storage = Arc::new(MemoryStorage::new());
        storage.store(ORIGIN, "{not json at all").unwrap();

        let store = store_with(storage.clone());
        let id = store.session_id();
        assert!(id.as_str().starts_with("sess_"));

        // The corrupt record was replaced with a valid one
        let raw = storage.load(ORIGIN).unwrap().unwrap();
        assert!(serde_json::from_str::<PersistedSession>(&raw).is_ok());
    }

    #[test]
    fn origins_do_not_share_sessions() {
        let storage: Arc<dyn SessionStorage> = Arc::new(MemoryStorage::new());
        let a = SessionStore::new(storage.clone(), "https://a.example.com").session_id();
        let b = SessionStore::new(storage, "https://b.example.com").session_id();
        assert_ne!(a, b);
    }

    struct FailingStorage;

    impl SessionStorage for FailingStorage {
        fn load(&self, _origin: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Database("disk on fire".into()))
        }
        fn store(&self, _origin: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Database("disk on fire".into()))
        }
        fn remove(&self, _origin: &str) -> Result<(), StorageError> {
            Err(StorageError::Database("disk on fire".into()))
        }
    }

    #[test]
    fn storage_failure_never_reaches_caller() {
        let store = store_with(Arc::new(FailingStorage));
        let a = store.session_id();
        store.touch();
        let b = store.session_id();
        assert_eq!(a, b);
    }

    #[test]
    fn wire_format_uses_last_activity_camel_case() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(storage.clone());
        let _ = store.session_id();

        let raw = storage.load(ORIGIN).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value.get("id").is_some());
        assert!(value.get("lastActivity").is_some());
    }
}
