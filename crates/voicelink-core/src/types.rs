use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Protocol step currently requested or reported for a session.
///
/// The shared store enforces no ordering between these; the two state
/// machines uphold the step sequence cooperatively. Serialized in camelCase
/// to match the store schema shared with the extension process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandKind {
    /// Extension asks the host to acquire microphone permissions.
    ArmMic,
    /// Host confirms permissions are granted and capture can begin.
    MicReady,
    /// Extension asks the host to start audio capture.
    StartRecording,
    /// Extension asks the host to stop capture and produce text.
    StopRecording,
    /// Host reports that cleanup of the transcript is underway.
    Processing,
    /// Host reports that `cleanedText` is ready for insertion.
    TextReady,
    /// Extension abandons the session; host obeys opportunistically.
    CancelRecording,
    /// Host reports a failure; details in the session `error` field.
    Error,
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CommandKind::ArmMic => "armMic",
            CommandKind::MicReady => "micReady",
            CommandKind::StartRecording => "startRecording",
            CommandKind::StopRecording => "stopRecording",
            CommandKind::Processing => "processing",
            CommandKind::TextReady => "textReady",
            CommandKind::CancelRecording => "cancelRecording",
            CommandKind::Error => "error",
        };
        write!(f, "{}", name)
    }
}

/// One dictation attempt, identified end-to-end by `session_id`.
///
/// Created by the extension, mutated by whichever side drives the current
/// step, cleared by the extension on completion or abandoned on error.
/// `timestamp` is refreshed on every write and is diagnostic only — readers
/// must never use it for ordering.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictationSession {
    pub session_id: Uuid,
    pub command: CommandKind,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DictationSession {
    /// Create a fresh session in the `armMic` step with a new unique id.
    pub fn armed() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            command: CommandKind::ArmMic,
            timestamp: Utc::now(),
            error: None,
        }
    }

    /// Rewrite this session with a new command and a fresh timestamp.
    ///
    /// Keeps the same `session_id` so the other side's staleness check
    /// continues to accept the record.
    pub fn advanced(&self, command: CommandKind) -> Self {
        Self {
            session_id: self.session_id,
            command,
            timestamp: Utc::now(),
            error: None,
        }
    }

    /// Build a command record for an already-known session id.
    pub fn command(session_id: Uuid, command: CommandKind) -> Self {
        Self {
            session_id,
            command,
            timestamp: Utc::now(),
            error: None,
        }
    }

    /// Build an error record for the given session.
    pub fn failed(session_id: Uuid, message: impl Into<String>) -> Self {
        Self {
            session_id,
            command: CommandKind::Error,
            timestamp: Utc::now(),
            error: Some(message.into()),
        }
    }
}

/// Store keys shared between the two processes.
///
/// Kept as constants so both sides and the tests agree on the schema.
pub mod keys {
    pub const CURRENT_SESSION: &str = "currentSession";
    pub const RAW_TRANSCRIPT: &str = "rawTranscript";
    pub const CLEANED_TEXT: &str = "cleanedText";
    pub const HOST_LIVENESS: &str = "hostLiveness";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_kind_serde_names() {
        let json = serde_json::to_string(&CommandKind::ArmMic).unwrap();
        assert_eq!(json, "\"armMic\"");
        let json = serde_json::to_string(&CommandKind::TextReady).unwrap();
        assert_eq!(json, "\"textReady\"");
        let json = serde_json::to_string(&CommandKind::CancelRecording).unwrap();
        assert_eq!(json, "\"cancelRecording\"");

        let parsed: CommandKind = serde_json::from_str("\"startRecording\"").unwrap();
        assert_eq!(parsed, CommandKind::StartRecording);
    }

    #[test]
    fn test_command_kind_display_matches_serde() {
        for kind in [
            CommandKind::ArmMic,
            CommandKind::MicReady,
            CommandKind::StartRecording,
            CommandKind::StopRecording,
            CommandKind::Processing,
            CommandKind::TextReady,
            CommandKind::CancelRecording,
            CommandKind::Error,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind));
        }
    }

    #[test]
    fn test_armed_session_is_unique() {
        let a = DictationSession::armed();
        let b = DictationSession::armed();
        assert_ne!(a.session_id, b.session_id);
        assert_eq!(a.command, CommandKind::ArmMic);
        assert!(a.error.is_none());
    }

    #[test]
    fn test_advanced_keeps_id_and_refreshes_timestamp() {
        let a = DictationSession::armed();
        let b = a.advanced(CommandKind::MicReady);
        assert_eq!(a.session_id, b.session_id);
        assert_eq!(b.command, CommandKind::MicReady);
        assert!(b.timestamp >= a.timestamp);
    }

    #[test]
    fn test_failed_session_carries_message() {
        let id = Uuid::new_v4();
        let s = DictationSession::failed(id, "mic permission denied");
        assert_eq!(s.session_id, id);
        assert_eq!(s.command, CommandKind::Error);
        assert_eq!(s.error.as_deref(), Some("mic permission denied"));
    }

    #[test]
    fn test_session_json_round_trip() {
        let s = DictationSession::armed();
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"sessionId\""));
        assert!(json.contains("\"armMic\""));
        // error is absent, not null
        assert!(!json.contains("\"error\""));

        let back: DictationSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
