//! Persistent key-value store shared by every component.
//!
//! A flat string-keyed JSON object persisted to a single file, holding the
//! session token, favorites, premium sentinel, UI state, and the price
//! cache. Mutations flush before returning, so
//! a crash never loses an acknowledged write. Writers interleave at
//! last-write-wins granularity; all writes are single-key sets.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, VbeaError};

/// Storage key for the session bearer token.
pub const KEY_AUTH_TOKEN: &str = "auth_token";
/// Storage key for the active tab.
pub const KEY_CURRENT_TAB: &str = "currentTab";
/// Storage key for the favorite ID list (JSON array of strings).
pub const KEY_FAVORITE_AGENTS: &str = "favoriteAgents";
/// Storage key for the premium sentinel (`"true"` or absent).
pub const KEY_WALLET_PREMIUM: &str = "walletPremium";
/// Storage key for the UI theme.
pub const KEY_THEME: &str = "theme";
/// Storage key for the sidebar collapsed flag.
pub const KEY_SIDEBAR_COLLAPSED: &str = "sidebarCollapsed";
/// Storage key for the cached price snapshot.
pub const KEY_CRYPTO_PRICES: &str = "crypto_prices";

/// File-backed JSON key-value store.
#[derive(Debug)]
pub struct LocalStore {
    path: Option<PathBuf>,
    map: Mutex<BTreeMap<String, Value>>,
}

impl LocalStore {
    /// Volatile store for tests and one-shot commands.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            map: Mutex::new(BTreeMap::new()),
        }
    }

    /// Open a store at `path`, loading existing contents if present.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let map = if path.exists() {
            let raw = std::fs::read(&path)
                .map_err(|e| VbeaError::Storage(format!("read {}: {e}", path.display())))?;
            serde_json::from_slice(&raw)
                .map_err(|e| VbeaError::Storage(format!("parse {}: {e}", path.display())))?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path: Some(path),
            map: Mutex::new(map),
        })
    }

    /// Get a string value.
    pub fn get_str(&self, key: &str) -> Option<String> {
        let map = self.map.lock().expect("store lock poisoned");
        map.get(key).and_then(Value::as_str).map(str::to_string)
    }

    /// Set a string value and flush.
    pub fn set_str(&self, key: &str, value: &str) -> Result<()> {
        self.set_value(key, Value::String(value.to_string()))
    }

    /// Get a JSON-typed value. Returns `None` on absence or shape mismatch.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let map = self.map.lock().expect("store lock poisoned");
        map.get(key)
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
    }

    /// Set a JSON-typed value and flush.
    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.set_value(key, value)
    }

    /// Remove a key and flush. Removing an absent key is a no-op.
    pub fn remove(&self, key: &str) -> Result<()> {
        let snapshot = {
            let mut map = self.map.lock().expect("store lock poisoned");
            if map.remove(key).is_none() {
                return Ok(());
            }
            map.clone()
        };
        self.flush(&snapshot)
    }

    /// `true` if the key holds the string `"true"`.
    pub fn flag(&self, key: &str) -> bool {
        self.get_str(key).as_deref() == Some("true")
    }

    fn set_value(&self, key: &str, value: Value) -> Result<()> {
        let snapshot = {
            let mut map = self.map.lock().expect("store lock poisoned");
            map.insert(key.to_string(), value);
            map.clone()
        };
        self.flush(&snapshot)
    }

    fn flush(&self, map: &BTreeMap<String, Value>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let raw = serde_json::to_vec_pretty(map)?;
        std::fs::write(path, raw)
            .map_err(|e| VbeaError::Storage(format!("write {}: {e}", path.display())))
    }
}
