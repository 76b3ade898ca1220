//! Voicelink Store crate - the shared key-value store both processes poll.
//!
//! The store is the only channel carrying protocol state between the
//! sandboxed extension and the companion process. It offers last-write-wins
//! semantics and nothing more: no locking, no notification, no ordering.
//! Correctness comes from the protocol (unique session ids and mutual
//! staleness checks), not from the store.
//!
//! `SqliteStore` is the durable implementation (WAL mode so two processes
//! can read and write concurrently); `MemoryStore` is the deterministic
//! in-process double used by tests.

pub mod memory;
pub mod sqlite;

use voicelink_core::error::Result;
use voicelink_core::types::DictationSession;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Persistent shared key-value store visible to both processes.
///
/// Writes are durable until explicitly cleared and only observed by the
/// other side at its next poll tick. Implementations must be safe under
/// concurrent access from two independent processes without locking;
/// last-write-wins is acceptable by design.
pub trait SessionStore: Send + Sync {
    /// Write (or overwrite) the current session record.
    fn set_session(&self, session: &DictationSession) -> Result<()>;

    /// Read the current session record, if any.
    fn session(&self) -> Result<Option<DictationSession>>;

    /// Remove the current session record.
    fn clear_session(&self) -> Result<()>;

    /// Write the partial/final raw transcript (live-feedback field).
    fn set_raw_transcript(&self, text: &str) -> Result<()>;

    /// Read the raw transcript, if present.
    fn raw_transcript(&self) -> Result<Option<String>>;

    /// Write the cleaned text produced by the cleanup collaborator.
    fn set_cleaned_text(&self, text: &str) -> Result<()>;

    /// Read the cleaned text, if present.
    fn cleaned_text(&self) -> Result<Option<String>>;

    /// Remove both text fields (session teardown housekeeping).
    fn clear_text(&self) -> Result<()>;

    /// Persist the companion-ready flag.
    fn set_host_ready(&self, ready: bool) -> Result<()>;

    /// Read the companion-ready flag. Absent means not ready.
    fn host_ready(&self) -> Result<bool>;
}
