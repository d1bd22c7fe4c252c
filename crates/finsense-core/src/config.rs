//! Application configuration management.
//!
//! This module handles loading and saving the client configuration, which
//! includes the API base URL, where the session is kept and the public
//! login path.
//!
//! Configuration is stored at `~/.config/finsense/config.json`. The
//! `FINSENSE_API_BASE_URL` environment variable overrides the stored base URL.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::{FileSessionStore, KeyringSessionStore, RouteGuard, SessionStore, DEFAULT_LOGIN_PATH};

/// Application name used for config/data directory paths
const APP_NAME: &str = "finsense";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable holding the API base URL
pub const API_BASE_URL_ENV: &str = "FINSENSE_API_BASE_URL";

/// Where the session token is persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub session_backend: SessionBackend,
    pub login_path: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    /// Load the config file and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env_override(std::env::var(API_BASE_URL_ENV).ok());
        Ok(config)
    }

    /// Load from an explicit path. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// An environment-provided base URL wins over the file's value.
    pub fn apply_env_override(&mut self, base_url: Option<String>) {
        if let Some(url) = base_url {
            self.api_base_url = Some(url);
        }
    }

    /// Base URL for relative API paths. Not validated; empty when unset.
    pub fn api_base_url(&self) -> String {
        self.api_base_url.clone().unwrap_or_default()
    }

    pub fn login_path(&self) -> &str {
        self.login_path.as_deref().unwrap_or(DEFAULT_LOGIN_PATH)
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Open the configured session store.
    pub fn session_store(&self) -> Result<Arc<dyn SessionStore>> {
        let store: Arc<dyn SessionStore> = match self.session_backend {
            SessionBackend::File => Arc::new(FileSessionStore::new(self.data_dir()?)),
            SessionBackend::Keyring => Arc::new(KeyringSessionStore::new()),
        };
        Ok(store)
    }

    pub fn route_guard(&self, session: Arc<dyn SessionStore>) -> RouteGuard {
        RouteGuard::new(session).with_login_path(self.login_path())
    }
}
