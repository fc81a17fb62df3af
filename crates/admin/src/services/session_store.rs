//! Persistent session slot.
//!
//! Each browser context (or CLI profile) owns exactly one slot holding a
//! [`StoredSession`]. The web app keeps it in the signed `tower-sessions`
//! cookie session, the CLI in a file, and tests in memory.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tower_sessions::Session;

use crate::models::StoredSession;
use crate::models::session_keys::ADMIN_SESSION;

/// Errors reading or writing the session slot.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    /// The session backend failed.
    #[error("session backend error: {0}")]
    Backend(String),

    /// The slot holds something that is not a stored session.
    #[error("malformed session slot: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Reading or writing the session file failed.
    #[error("session file error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<tower_sessions::session::Error> for SessionStoreError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Storage for a single [`StoredSession`] slot.
pub trait SessionStore: Send + Sync {
    /// Read the slot. `Ok(None)` means it is empty.
    fn load(&self) -> impl Future<Output = Result<Option<StoredSession>, SessionStoreError>> + Send;

    /// Overwrite the slot.
    fn save(
        &self,
        session: &StoredSession,
    ) -> impl Future<Output = Result<(), SessionStoreError>> + Send;

    /// Empty the slot. Clearing an empty slot succeeds.
    fn clear(&self) -> impl Future<Output = Result<(), SessionStoreError>> + Send;
}

// =============================================================================
// Cookie session (web)
// =============================================================================

/// Slot stored under [`ADMIN_SESSION`] in the request's `tower-sessions` session.
#[derive(Debug, Clone)]
pub struct CookieSessionStore {
    session: Session,
}

impl CookieSessionStore {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    /// The underlying request session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }
}

impl SessionStore for CookieSessionStore {
    async fn load(&self) -> Result<Option<StoredSession>, SessionStoreError> {
        let Some(value) = self
            .session
            .get::<serde_json::Value>(ADMIN_SESSION)
            .await?
        else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_value(value)?))
    }

    async fn save(&self, session: &StoredSession) -> Result<(), SessionStoreError> {
        // New identity, new session ID.
        self.session.cycle_id().await?;
        self.session.insert(ADMIN_SESSION, session).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionStoreError> {
        self.session.remove_value(ADMIN_SESSION).await?;
        Ok(())
    }
}

// =============================================================================
// File (CLI)
// =============================================================================

/// Slot stored as a JSON file, one per CLI profile.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<StoredSession>, SessionStoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, session: &StoredSession) -> Result<(), SessionStoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec_pretty(session)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600)).await?;
        }

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionStoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// Memory (tests)
// =============================================================================

/// Slot held in memory as raw JSON. Clones share the slot.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot pre-filled with arbitrary text, e.g. a corrupted session.
    #[must_use]
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(raw.into()))),
        }
    }

    /// Current raw contents of the slot.
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the raw contents of the slot.
    pub fn set_raw(&self, raw: Option<String>) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = raw;
    }
}

impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<StoredSession>, SessionStoreError> {
        self.raw()
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(Into::into)
    }

    async fn save(&self, session: &StoredSession) -> Result<(), SessionStoreError> {
        let raw = serde_json::to_string(session)?;
        self.set_raw(Some(raw));
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionStoreError> {
        self.set_raw(None);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn stored() -> StoredSession {
        StoredSession {
            authenticated: true,
            admin_id: "6f1c1c1e-8a1b-4e43-9d7e-1f1e7c1c0a11".to_string(),
            email: "pres@chapter.edu".to_string(),
            expires: 4_102_444_800_000,
        }
    }

    #[tokio::test]
    async fn test_file_store_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("profile").join("session.json"));

        assert_eq!(store.load().await.unwrap(), None);

        store.save(&stored()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(stored()));

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
        // Second clear is a no-op.
        store.clear().await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));
        store.save(&stored()).await.unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileSessionStore::new(path);
        assert!(matches!(
            store.load().await,
            Err(SessionStoreError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_memory_store_shares_slot_between_clones() {
        let store = MemorySessionStore::new();
        let other = store.clone();

        store.save(&stored()).await.unwrap();
        assert_eq!(other.load().await.unwrap(), Some(stored()));

        other.clear().await.unwrap();
        assert!(store.raw().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_malformed_slot() {
        let store = MemorySessionStore::with_raw(r#"{"authenticated": "yes"}"#);
        assert!(store.load().await.is_err());
    }
}
