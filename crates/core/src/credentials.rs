//! Credential storage abstraction
//!
//! The client sees persisted credentials as an opaque string-keyed blob
//! store with three operations: get, set, remove. On mobile that role is
//! played by the platform keychain/AsyncStorage; here it is a trait so the
//! client can be wired to a file on disk, an in-memory map in tests, or an
//! embedder-provided store.
//!
//! The store holds whole values only. The client's discipline is
//! read-then-replace of the entire blob, never partial-field mutation.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;

/// Store key for the serialized [`TokenInfo`](crate::token::TokenInfo)
pub const TOKEN_KEY: &str = "token";

/// Store key for the serialized [`UserProfile`](crate::token::UserProfile)
pub const USER_INFO_KEY: &str = "userInfo";

/// Errors from credential store implementations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying file I/O failed
    #[error("credential store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data is not valid JSON
    #[error("credential store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// In-memory lock was poisoned by a panicking writer
    #[error("credential store lock poisoned")]
    Poisoned,
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Async key-value store for opaque credential blobs
///
/// Implementations must be safe to share across tasks. Values are whole
/// serialized documents; `set` replaces the previous value atomically from
/// the reader's point of view.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read the value stored under `key`, if any
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Delete the value under `key`; deleting a missing key is not an error
    async fn remove(&self, key: &str) -> StoreResult<()>;
}

/// In-memory credential store
///
/// Used by tests and by embedders that manage persistence themselves.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let guard = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut guard = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        let mut guard = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        guard.remove(key);
        Ok(())
    }
}

/// File-backed credential store
///
/// Keeps all entries in a single JSON object on disk. Every write rewrites
/// the whole file through a sibling temp file and rename, so a reader never
/// observes a partially written document. Blob values are small (a token
/// pair and a profile), so the blocking I/O here is negligible.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    // Serializes read-modify-write cycles against the file
    lock: RwLock<()>,
}

impl FileCredentialStore {
    /// Open a store at an explicit path, creating parent directories
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path,
            lock: RwLock::new(()),
        })
    }

    /// Open the default per-user store (`<config dir>/nutrilog/credentials.json`)
    pub fn open_default() -> StoreResult<Self> {
        let dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("nutrilog");
        Self::open(dir.join("credentials.json"))
    }

    /// Path of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> StoreResult<HashMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
            Ok(raw) => {
                // Values are stored as embedded JSON documents
                let doc: HashMap<String, Value> = serde_json::from_str(&raw)?;
                Ok(doc
                    .into_iter()
                    .map(|(k, v)| match v {
                        Value::String(s) => (k, s),
                        other => (k, other.to_string()),
                    })
                    .collect())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn persist(&self, entries: &HashMap<String, String>) -> StoreResult<()> {
        let doc: HashMap<&str, Value> = entries
            .iter()
            .map(|(k, v)| (k.as_str(), Value::String(v.clone())))
            .collect();
        let raw = serde_json::to_string_pretty(&doc)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let _guard = self.lock.read().map_err(|_| StoreError::Poisoned)?;
        Ok(self.load()?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let _guard = self.lock.write().map_err(|_| StoreError::Poisoned)?;
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        let _guard = self.lock.write().map_err(|_| StoreError::Poisoned)?;
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }
}
