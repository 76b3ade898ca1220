//! Voicelink Core crate - shared protocol types, errors, and configuration.
//!
//! Defines the session/command vocabulary both processes agree on, the
//! error taxonomy, and the TOML configuration both binaries load.

pub mod config;
pub mod error;
pub mod types;

pub use config::VoicelinkConfig;
pub use error::{Result, VoicelinkError};
pub use types::{keys, CommandKind, DictationSession};
