use std::{
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use serde::{Deserialize, Serialize};

use super::ClientError;
use crate::models::User;

/// What the client remembers between runs: the bearer token and the user it
/// belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<User>,
}

impl Session {
    /// The user, but only when a token is held as well.
    pub fn authenticated_user(&self) -> Option<&User> {
        match (&self.token, &self.user) {
            (Some(_), Some(user)) => Some(user),
            _ => None,
        }
    }
}

pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Session, ClientError>;
    fn save(&self, session: &Session) -> Result<(), ClientError>;
    fn clear(&self) -> Result<(), ClientError>;
}

/// Keeps the session as pretty JSON in a single file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Session, ClientError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Session::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, session: &Session) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_vec_pretty(session)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Session, ClientError> {
        Ok(self.inner.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save(&self, session: &Session) -> Result<(), ClientError> {
        // a poisoned lock still holds a whole Session
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = session.clone();
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        self.save(&Session::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use chrono::Utc;
    use uuid::Uuid;

    fn signed_in() -> Session {
        Session {
            token: Some("abc".to_string()),
            user: Some(User {
                id: Uuid::new_v4(),
                name: "Ana".to_string(),
                email: "ana@example.com".to_string(),
                role: Role::User,
                created_at: Utc::now(),
            }),
        }
    }

    #[test]
    fn file_store_round_trips_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested/session.json"));

        assert_eq!(store.load().unwrap(), Session::default());

        let session = signed_in();
        store.save(&session).unwrap();
        assert!(store.path().exists());
        assert_eq!(store.load().unwrap(), session);

        store.clear().unwrap();
        assert!(!store.path().exists());
        assert_eq!(store.load().unwrap(), Session::default());
        // clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn corrupt_session_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"not json").unwrap();
        let store = FileSessionStore::new(path);
        assert!(matches!(store.load(), Err(ClientError::SessionFormat(_))));
    }

    #[test]
    fn memory_store_holds_last_saved_session() {
        let store = MemorySessionStore::new();
        store.save(&signed_in()).unwrap();
        assert!(store.load().unwrap().authenticated_user().is_some());
        store.clear().unwrap();
        assert!(store.load().unwrap().authenticated_user().is_none());
    }

    #[test]
    fn memory_store_survives_a_poisoned_lock() {
        let store = std::sync::Arc::new(MemorySessionStore::new());
        let poisoner = std::sync::Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.inner.lock().unwrap();
            panic!("poison the session lock");
        })
        .join();
        assert!(store.inner.is_poisoned());

        store.save(&signed_in()).unwrap();
        assert!(store.load().unwrap().authenticated_user().is_some());
    }

    #[test]
    fn user_without_token_is_anonymous() {
        let mut session = signed_in();
        session.token = None;
        assert!(session.authenticated_user().is_none());
    }
}
