//! In-memory store for deterministic tests.
//!
//! Behaves like the SQLite store minus durability, and adds an
//! "unavailable" switch so tests can exercise the store-failure policy
//! (reads return errors, writes are dropped, neither side crashes).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use voicelink_core::error::{Result, VoicelinkError};
use voicelink_core::types::{keys, DictationSession};

use crate::SessionStore;

/// Map-backed store double. Tests hand one instance (behind an `Arc`) to
/// both state machines, so it stands in for the store as seen from both
/// processes.
#[derive(Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, String>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail, simulating the shared store
    /// becoming unreachable (e.g. the container not yet provisioned).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(VoicelinkError::Store("store unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    fn put(&self, key: &str, value: String) -> Result<()> {
        self.check()?;
        self.map
            .lock()
            .map_err(|e| VoicelinkError::Store(format!("Store lock poisoned: {}", e)))?
            .insert(key.to_string(), value);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        self.check()?;
        Ok(self
            .map
            .lock()
            .map_err(|e| VoicelinkError::Store(format!("Store lock poisoned: {}", e)))?
            .get(key)
            .cloned())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.check()?;
        self.map
            .lock()
            .map_err(|e| VoicelinkError::Store(format!("Store lock poisoned: {}", e)))?
            .remove(key);
        Ok(())
    }
}

impl SessionStore for MemoryStore {
    fn set_session(&self, session: &DictationSession) -> Result<()> {
        let json = serde_json::to_string(session)?;
        self.put(keys::CURRENT_SESSION, json)
    }

    fn session(&self) -> Result<Option<DictationSession>> {
        match self.get(keys::CURRENT_SESSION)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn clear_session(&self) -> Result<()> {
        self.delete(keys::CURRENT_SESSION)
    }

    fn set_raw_transcript(&self, text: &str) -> Result<()> {
        self.put(keys::RAW_TRANSCRIPT, text.to_string())
    }

    fn raw_transcript(&self) -> Result<Option<String>> {
        self.get(keys::RAW_TRANSCRIPT)
    }

    fn set_cleaned_text(&self, text: &str) -> Result<()> {
        self.put(keys::CLEANED_TEXT, text.to_string())
    }

    fn cleaned_text(&self) -> Result<Option<String>> {
        self.get(keys::CLEANED_TEXT)
    }

    fn clear_text(&self) -> Result<()> {
        self.delete(keys::RAW_TRANSCRIPT)?;
        self.delete(keys::CLEANED_TEXT)
    }

    fn set_host_ready(&self, ready: bool) -> Result<()> {
        self.put(keys::HOST_LIVENESS, ready.to_string())
    }

    fn host_ready(&self) -> Result<bool> {
        Ok(self.get(keys::HOST_LIVENESS)?.as_deref() == Some("true"))
    }
}
