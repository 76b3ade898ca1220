use serde::{Deserialize, Serialize};

/// Signals exchanged over the liveness channel.
///
/// Only the first three drive current behavior. The direct-command names
/// are retained from an older notification path that the store-polling
/// protocol supersedes but does not remove; both sides still recognize
/// them on the wire and ignore them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub enum Signal {
    /// Extension asks "is anyone there?".
    Ping,
    /// Companion answers a ping; receipt marks the host as ready.
    Pong,
    /// Companion announces a foreground/background transition.
    HostAppStateChanged { ready: bool },

    // Legacy direct-command signals, superseded by store polling.
    RecordingStarted,
    TextReady,
    StartRecording,
    StopRecording,
    CancelRecording,
}

impl Signal {
    /// Whether this signal belongs to the superseded direct-command path.
    pub fn is_legacy(&self) -> bool {
        matches!(
            self,
            Signal::RecordingStarted
                | Signal::TextReady
                | Signal::StartRecording
                | Signal::StopRecording
                | Signal::CancelRecording
        )
    }
}
