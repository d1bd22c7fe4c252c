use keyring::Entry;
use tracing::{debug, warn};

use super::session::{SessionError, SessionStore};

const SERVICE_NAME: &str = "finsense";

/// Keychain entry holding the bearer token
const TOKEN_KEY: &str = "token";

/// Keychain entry holding the display name
const DISPLAY_NAME_KEY: &str = "userName";

/// Session store backed by the OS keychain.
///
/// The token and display name live in two separate entries under the
/// `finsense` service. A missing entry reads as absent.
pub struct KeyringSessionStore {
    service: String,
}

impl KeyringSessionStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// Use a different keychain service name (e.g. per API environment).
    pub fn with_service(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, SessionError> {
        Ok(Entry::new(&self.service, key)?)
    }

    fn read(&self, key: &str) -> Option<String> {
        let entry = match self.entry(key) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "Failed to open keychain entry");
                return None;
            }
        };
        match entry.get_password() {
            Ok(value) => Some(value),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                warn!(key, error = %e, "Failed to read keychain entry");
                None
            }
        }
    }

    fn delete(&self, key: &str) -> Result<(), SessionError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Default for KeyringSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for KeyringSessionStore {
    fn token(&self) -> Option<String> {
        self.read(TOKEN_KEY)
    }

    fn display_name(&self) -> Option<String> {
        self.read(DISPLAY_NAME_KEY)
    }

    fn set_session(&self, token: &str, display_name: Option<&str>) -> Result<(), SessionError> {
        self.entry(TOKEN_KEY)?.set_password(token)?;
        match display_name {
            Some(name) => self.entry(DISPLAY_NAME_KEY)?.set_password(name)?,
            None => self.delete(DISPLAY_NAME_KEY)?,
        }
        debug!(service = %self.service, "Session stored in keychain");
        Ok(())
    }

    fn clear_session(&self) -> Result<(), SessionError> {
        self.delete(TOKEN_KEY)?;
        self.delete(DISPLAY_NAME_KEY)?;
        debug!(service = %self.service, "Session removed from keychain");
        Ok(())
    }
}
