//! Chat client configuration parsed from environment variables.
//!
//! Front ends that accept flags layer them over the environment through
//! [`ChatConfig::from_lookup`]; [`ChatConfig::from_env`] reads the process
//! environment directly.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use tracing::warn;

use crate::net::firestore::FirestoreStore;
use crate::net::memory::MemoryStore;
use crate::net::store::{DocumentStore, StoreError};
use crate::util::persistence::{FileStorage, MemoryStorage, SessionStorage};

pub const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_FIRESTORE_DATABASE: &str = "(default)";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

const APP_DIR: &str = "chatline";
const SESSION_FILE_NAME: &str = "session.json";

/// Errors from config parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("missing required setting: {var}")]
    Missing { var: String },

    /// A variable is set to an unusable value.
    #[error("invalid {var}: {message}")]
    Invalid { var: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreKind {
    #[default]
    Memory,
    Firestore,
}

impl FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "firestore" => Ok(Self::Firestore),
            other => Err(ConfigError::Invalid {
                var: "CHATLINE_STORE".into(),
                message: format!("unknown store '{other}' (expected 'memory' or 'firestore')"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub database: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub timeouts: StoreTimeouts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    pub store: StoreKind,
    /// Present when `store` is [`StoreKind::Firestore`].
    pub firestore: Option<FirestoreConfig>,
    /// Session identity file. `None` keeps the session in memory only.
    pub session_file: Option<PathBuf>,
}

impl ChatConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `CHATLINE_STORE`: `memory` (default) or `firestore`
    /// - `CHATLINE_SESSION_FILE`: defaults to `<data dir>/chatline/session.json`;
    ///   an empty value disables persistence
    /// - `FIRESTORE_DATABASE`: default `(default)`
    /// - `FIRESTORE_API_KEY`
    /// - `FIRESTORE_BASE_URL`: default Firestore REST endpoint
    /// - `CHATLINE_POLL_INTERVAL_MS`: default 1000
    /// - `CHATLINE_REQUEST_TIMEOUT_SECS`: default 30
    /// - `CHATLINE_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// Required when the store is `firestore`:
    /// - `FIRESTORE_PROJECT_ID`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for unknown store kinds or a missing project id.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build typed config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ChatConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = match lookup("CHATLINE_STORE") {
            Some(raw) => raw.parse()?,
            None => StoreKind::default(),
        };

        let firestore = match store {
            StoreKind::Memory => None,
            StoreKind::Firestore => Some(firestore_from_lookup(&lookup)?),
        };

        let session_file = match lookup("CHATLINE_SESSION_FILE") {
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => Some(PathBuf::from(raw)),
            None => default_session_file(),
        };

        Ok(Self { store, firestore, session_file })
    }

    /// Open the configured document store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when Firestore is selected without
    /// settings and other variants when the HTTP client cannot be built.
    pub fn open_store(&self) -> Result<Arc<dyn DocumentStore>, StoreError> {
        match (self.store, &self.firestore) {
            (StoreKind::Memory, _) => Ok(Arc::new(MemoryStore::new())),
            (StoreKind::Firestore, Some(firestore)) => Ok(Arc::new(FirestoreStore::new(firestore)?)),
            (StoreKind::Firestore, None) => Err(StoreError::Unavailable("firestore settings missing".into())),
        }
    }

    /// Open the configured session storage.
    #[must_use]
    pub fn open_storage(&self) -> Arc<dyn SessionStorage> {
        match &self.session_file {
            Some(path) => Arc::new(FileStorage::new(path.clone())),
            None => {
                warn!("session persistence disabled; identity lives in memory only");
                Arc::new(MemoryStorage::new())
            }
        }
    }
}

fn firestore_from_lookup<F>(lookup: &F) -> Result<FirestoreConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let project_id = lookup("FIRESTORE_PROJECT_ID")
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::Missing { var: "FIRESTORE_PROJECT_ID".into() })?;
    let database = lookup("FIRESTORE_DATABASE")
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FIRESTORE_DATABASE.to_string());
    let api_key = lookup("FIRESTORE_API_KEY").filter(|v| !v.trim().is_empty());
    let base_url = lookup("FIRESTORE_BASE_URL")
        .unwrap_or_else(|| DEFAULT_FIRESTORE_BASE_URL.to_string())
        .trim_end_matches('/')
        .to_string();
    let poll_interval_ms = parse_u64(lookup, "CHATLINE_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS).max(1);
    let timeouts = StoreTimeouts {
        request_secs: parse_u64(lookup, "CHATLINE_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
        connect_secs: parse_u64(lookup, "CHATLINE_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
    };

    Ok(FirestoreConfig { project_id, database, api_key, base_url, poll_interval_ms, timeouts })
}

fn parse_u64<F>(lookup: &F, key: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

/// `<data dir>/chatline/session.json`, when the platform has a data dir.
#[must_use]
pub fn default_session_file() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(APP_DIR).join(SESSION_FILE_NAME))
}
