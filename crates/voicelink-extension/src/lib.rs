//! Voicelink Extension crate - the sandboxed keyboard-side state machine.
//!
//! Runs inside the input-method extension, which has no microphone access
//! and no direct call path to the companion process. It originates
//! sessions, polls the shared store at a fine period, drives the visible
//! UI state, and performs text insertion. It never makes a blocking
//! external call — only store reads/writes and one insertion call — so
//! its poll loop stays non-blocking.

pub mod machine;
pub mod sink;
pub mod state;

pub use machine::ExtensionStateMachine;
pub use sink::{CollectingSink, TextSink};
pub use state::UiState;
