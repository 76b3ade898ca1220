//! Visible dictation UI state on the extension side.

use std::fmt;

/// What the keyboard UI shows for the current dictation attempt.
///
/// Forward path: Idle -> Arming -> Listening -> Processing -> Idle.
/// `Error` is reachable from any non-idle state and auto-recovers to
/// `Idle` after a fixed delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiState {
    /// No dictation in progress. Ready to start.
    Idle,
    /// Waiting for the companion to confirm microphone readiness.
    Arming,
    /// Companion is capturing audio.
    Listening,
    /// Companion is producing and cleaning the transcript.
    Processing,
    /// A companion-side failure, shown briefly before reset.
    Error(String),
}

impl fmt::Display for UiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UiState::Idle => write!(f, "Idle"),
            UiState::Arming => write!(f, "Arming"),
            UiState::Listening => write!(f, "Listening"),
            UiState::Processing => write!(f, "Processing"),
            UiState::Error(msg) => write!(f, "Error({})", msg),
        }
    }
}

impl UiState {
    /// Whether a dictation attempt is underway (anything but Idle).
    pub fn is_active(&self) -> bool {
        !matches!(self, UiState::Idle)
    }
}
