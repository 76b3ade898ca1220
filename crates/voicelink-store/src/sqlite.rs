//! SQLite-backed shared store.
//!
//! A single `store(key, value)` table holds the session record (JSON), the
//! two text fields, and the liveness flag. WAL mode lets the extension and
//! the companion open the same file concurrently; each row write is atomic
//! on its own, which is all the protocol requires (last-write-wins).

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use voicelink_core::error::{Result, VoicelinkError};
use voicelink_core::types::{keys, DictationSession};

use crate::SessionStore;

/// Durable cross-process store over a shared SQLite file.
///
/// The connection is wrapped in a Mutex since rusqlite `Connection` is not
/// Sync. Each process opens its own `SqliteStore` on the same path.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the shared store at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| VoicelinkError::Store(format!("Failed to open store: {}", e)))?;

        Self::init(&conn)?;
        info!("Shared store opened at {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory store (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| VoicelinkError::Store(format!("Failed to open in-memory store: {}", e)))?;
        Self::init(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 250;
             CREATE TABLE IF NOT EXISTS store (
                 key   TEXT PRIMARY KEY,
                 value TEXT NOT NULL
             );",
        )
        .map_err(|e| VoicelinkError::Store(format!("Failed to initialize store: {}", e)))
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| VoicelinkError::Store(format!("Store lock poisoned: {}", e)))?;
        conn.execute(
            "INSERT INTO store (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
        .map_err(|e| VoicelinkError::Store(format!("Write failed for {}: {}", key, e)))?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| VoicelinkError::Store(format!("Store lock poisoned: {}", e)))?;
        conn.query_row(
            "SELECT value FROM store WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| VoicelinkError::Store(format!("Read failed for {}: {}", key, e)))
    }

    fn delete(&self, key: &str) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| VoicelinkError::Store(format!("Store lock poisoned: {}", e)))?;
        conn.execute("DELETE FROM store WHERE key = ?1", params![key])
            .map_err(|e| VoicelinkError::Store(format!("Delete failed for {}: {}", key, e)))?;
        Ok(())
    }
}

impl SessionStore for SqliteStore {
    fn set_session(&self, session: &DictationSession) -> Result<()> {
        let json = serde_json::to_string(session)?;
        self.put(keys::CURRENT_SESSION, &json)
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
        self.put(keys::RAW_TRANSCRIPT, text)
    }

    fn raw_transcript(&self) -> Result<Option<String>> {
        self.get(keys::RAW_TRANSCRIPT)
    }

    fn set_cleaned_text(&self, text: &str) -> Result<()> {
        self.put(keys::CLEANED_TEXT, text)
    }

    fn cleaned_text(&self) -> Result<Option<String>> {
        self.get(keys::CLEANED_TEXT)
    }

    fn clear_text(&self) -> Result<()> {
        self.delete(keys::RAW_TRANSCRIPT)?;
        self.delete(keys::CLEANED_TEXT)
    }

    fn set_host_ready(&self, ready: bool) -> Result<()> {
        self.put(keys::HOST_LIVENESS, if ready { "true" } else { "false" })
    }

    fn host_ready(&self) -> Result<bool> {
        Ok(self.get(keys::HOST_LIVENESS)?.as_deref() == Some("true"))
    }
}
