use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Session file name in the data directory
pub const SESSION_FILE: &str = "session.json";

/// Label shown when no usable display name has been stored.
const DEFAULT_DISPLAY_LABEL: &str = "User";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to access session file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode session: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// The persisted session layout: a bearer token and a display name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(rename = "userName", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Client-side session storage.
///
/// Implementations are shared between the request gateway and the route
/// guard as `Arc<dyn SessionStore>`, so every method takes `&self`. Reads
/// never fail: an unreadable store is reported as an empty session.
pub trait SessionStore: Send + Sync {
    /// The persisted bearer token, if any.
    fn token(&self) -> Option<String>;

    /// The persisted display name, if any.
    fn display_name(&self) -> Option<String>;

    /// Persist a freshly issued token and display name.
    fn set_session(&self, token: &str, display_name: Option<&str>) -> Result<(), SessionError>;

    /// Remove every persisted session key. Clearing an empty store is a no-op.
    fn clear_session(&self) -> Result<(), SessionError>;

    /// The token if it is present and non-empty.
    fn active_token(&self) -> Option<String> {
        self.token().filter(|t| !t.is_empty())
    }

    fn is_authenticated(&self) -> bool {
        self.active_token().is_some()
    }

    /// Display name for headers and menus, falling back to "User" when the
    /// stored value is missing, blank or the string "undefined".
    fn display_label(&self) -> String {
        display_label_for(self.display_name().as_deref())
    }

    /// Upper-cased first letter of the display label, for avatar badges.
    fn initial(&self) -> Option<char> {
        self.display_label()
            .chars()
            .next()
            .and_then(|c| c.to_uppercase().next())
    }
}

pub(crate) fn display_label_for(name: Option<&str>) -> String {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() && name != "undefined" => name.to_string(),
        _ => DEFAULT_DISPLAY_LABEL.to_string(),
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Process-local session store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    data: RwLock<SessionData>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a session.
    pub fn with_token(token: &str, display_name: Option<&str>) -> Self {
        Self {
            data: RwLock::new(SessionData {
                token: Some(token.to_string()),
                display_name: display_name.map(str::to_string),
            }),
        }
    }

    fn snapshot(&self) -> SessionData {
        self.data
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl SessionStore for MemorySessionStore {
    fn token(&self) -> Option<String> {
        self.snapshot().token
    }

    fn display_name(&self) -> Option<String> {
        self.snapshot().display_name
    }

    fn set_session(&self, token: &str, display_name: Option<&str>) -> Result<(), SessionError> {
        let mut data = self
            .data
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *data = SessionData {
            token: Some(token.to_string()),
            display_name: display_name.map(str::to_string),
        };
        Ok(())
    }

    fn clear_session(&self) -> Result<(), SessionError> {
        let mut data = self
            .data
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *data = SessionData::default();
        Ok(())
    }
}

// ============================================================================
// File-backed store
// ============================================================================

/// Session persisted as a small JSON document on disk.
///
/// The file is re-read on every access so that a login or logout performed
/// by another process is picked up by the next request.
pub struct FileSessionStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self::at_path(data_dir.join(SESSION_FILE))
    }

    pub fn at_path(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn load(&self) -> SessionData {
        if !self.path.exists() {
            return SessionData::default();
        }

        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read session file");
                return SessionData::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(data) => data,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to parse session file");
                SessionData::default()
            }
        }
    }
}

impl SessionStore for FileSessionStore {
    fn token(&self) -> Option<String> {
        self.load().token
    }

    fn display_name(&self) -> Option<String> {
        self.load().display_name
    }

    fn set_session(&self, token: &str, display_name: Option<&str>) -> Result<(), SessionError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;
        let data = SessionData {
            token: Some(token.to_string()),
            display_name: display_name.map(str::to_string),
        };
        let contents = serde_json::to_string_pretty(&data)?;

        // Readers don't take the lock; swap the file in with a rename
        let mut file = tempfile::NamedTempFile::new_in(&parent)?;
        file.write_all(contents.as_bytes())?;
        file.persist(&self.path).map_err(|e| e.error)?;
        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    fn clear_session(&self) -> Result<(), SessionError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Session cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_lifecycle() {
        let store = MemorySessionStore::new();
        assert_eq!(store.token(), None);
        assert!(!store.is_authenticated());

        store.set_session("abc", Some("Asha")).unwrap();
        assert_eq!(store.token().as_deref(), Some("abc"));
        assert_eq!(store.display_name().as_deref(), Some("Asha"));
        assert!(store.is_authenticated());

        store.clear_session().unwrap();
        assert_eq!(store.token(), None);
        assert_eq!(store.display_name(), None);

        // Idempotent
        store.clear_session().unwrap();
        assert_eq!(store.token(), None);
    }

    #[test]
    fn test_empty_token_is_not_a_session() {
        let store = MemorySessionStore::with_token("", None);
        assert_eq!(store.token().as_deref(), Some(""));
        assert_eq!(store.active_token(), None);
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_display_label_fallbacks() {
        assert_eq!(display_label_for(Some("Ravi")), "Ravi");
        assert_eq!(display_label_for(Some("undefined")), "User");
        assert_eq!(display_label_for(Some("  ")), "User");
        assert_eq!(display_label_for(None), "User");

        let store = MemorySessionStore::with_token("t", Some("meera"));
        assert_eq!(store.initial(), Some('M'));
        let anonymous = MemorySessionStore::new();
        assert_eq!(anonymous.display_label(), "User");
        assert_eq!(anonymous.initial(), Some('U'));
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().to_path_buf());
        assert_eq!(store.token(), None);

        store.set_session("abc", Some("Asha")).unwrap();

        let reopened = FileSessionStore::new(dir.path().to_path_buf());
        assert_eq!(reopened.token().as_deref(), Some("abc"));
        assert_eq!(reopened.display_name().as_deref(), Some("Asha"));

        reopened.clear_session().unwrap();
        assert_eq!(store.token(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_file_store_layout_uses_two_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().to_path_buf());
        store.set_session("abc", Some("Asha")).unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["token"], "abc");
        assert_eq!(value["userName"], "Asha");
    }

    #[test]
    fn test_file_store_clear_without_file_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested"));
        store.clear_session().unwrap();
        store.clear_session().unwrap();
    }

    #[test]
    fn test_file_store_relogin_never_reads_as_logged_out() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileSessionStore::new(dir.path().to_path_buf()));
        store.set_session("abc", Some("Asha")).unwrap();

        let done = Arc::new(AtomicBool::new(false));
        let writer = {
            let store = store.clone();
            let done = done.clone();
            std::thread::spawn(move || {
                while !done.load(Ordering::Relaxed) {
                    store.set_session("abc", Some("Asha")).unwrap();
                }
            })
        };

        let mut misses = 0;
        for _ in 0..5000 {
            if store.token().as_deref() != Some("abc") {
                misses += 1;
            }
        }
        done.store(true, Ordering::Relaxed);
        writer.join().unwrap();

        assert_eq!(misses, 0);
        // No temp files left behind next to the session
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_file_store_corrupt_file_reads_as_anonymous() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SESSION_FILE);
        std::fs::write(&path, "{not json").unwrap();

        let store = FileSessionStore::at_path(path);
        assert_eq!(store.token(), None);
        assert!(!store.is_authenticated());
    }
}
