//! Text insertion seam toward the keyboard UI.

use std::sync::Mutex;

use voicelink_core::error::Result;

/// Destination for cleaned dictation text.
///
/// The real implementation inserts into the focused text field through the
/// input-method APIs; tests and the demo use `CollectingSink`.
pub trait TextSink: Send + Sync {
    /// Insert the given text at the current cursor position.
    fn insert(&self, text: &str) -> Result<()>;
}

/// Sink that records every insertion, for tests and the demo binary.
#[derive(Debug, Default)]
pub struct CollectingSink {
    inserted: Mutex<Vec<String>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything inserted so far, in order.
    pub fn inserted(&self) -> Vec<String> {
        self.inserted.lock().expect("sink mutex poisoned").clone()
    }
}

impl TextSink for CollectingSink {
    fn insert(&self, text: &str) -> Result<()> {
        self.inserted
            .lock()
            .expect("sink mutex poisoned")
            .push(text.to_string());
        Ok(())
    }
}
