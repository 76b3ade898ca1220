//! Voicelink Host crate - the companion-side command processor.
//!
//! Runs in the full-privilege companion process, which owns audio capture
//! and text cleanup. It polls the shared store at a coarse period (its
//! handlers suspend on slow external calls: permission prompts, capture,
//! model inference), claims one session at a time, and writes results
//! back for the extension to pick up.

pub mod capture;
pub mod cleanup;
pub mod processor;

pub use capture::{CaptureProvider, MockCaptureProvider};
pub use cleanup::{CleanupProvider, MockCleanupProvider};
pub use processor::HostCommandProcessor;
