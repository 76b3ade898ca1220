use thiserror::Error;

/// Top-level error type for the Voicelink system.
///
/// Covers both companion-side collaborator failures (which get written into
/// the session record for the extension to surface) and local infrastructure
/// failures. Store errors are deliberately non-fatal: callers log them and
/// proceed as if the read returned nothing / the write never happened.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VoicelinkError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Capture failed to start: {0}")]
    CaptureStart(String),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Cleanup model unavailable: {0}")]
    CleanupUnavailable(String),

    #[error("Cleanup processing failed: {0}")]
    CleanupFailed(String),

    #[error("Host app unreachable within {timeout_secs}s")]
    HostUnreachable { timeout_secs: u64 },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Text insertion error: {0}")]
    Insertion(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for VoicelinkError {
    fn from(err: toml::de::Error) -> Self {
        VoicelinkError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for VoicelinkError {
    fn from(err: toml::ser::Error) -> Self {
        VoicelinkError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for VoicelinkError {
    fn from(err: serde_json::Error) -> Self {
        VoicelinkError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Voicelink operations.
pub type Result<T> = std::result::Result<T, VoicelinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VoicelinkError::PermissionDenied("microphone".to_string());
        assert_eq!(err.to_string(), "Permission denied: microphone");

        let err = VoicelinkError::HostUnreachable { timeout_secs: 3 };
        assert_eq!(err.to_string(), "Host app unreachable within 3s");

        let err = VoicelinkError::CleanupUnavailable("model not loaded".to_string());
        assert_eq!(
            err.to_string(),
            "Cleanup model unavailable: model not loaded"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: VoicelinkError = io_err.into();
        assert!(matches!(err, VoicelinkError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let bad_json = "{ invalid json }";
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str(bad_json);
        let err: VoicelinkError = parse.unwrap_err().into();
        assert!(matches!(err, VoicelinkError::Serialization(_)));
    }

    #[test]
    fn test_error_from_toml_de() {
        let bad_toml = "invalid = [[[";
        let parse: std::result::Result<toml::Value, _> = toml::from_str(bad_toml);
        let err: VoicelinkError = parse.unwrap_err().into();
        assert!(matches!(err, VoicelinkError::Config(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let _value = io_result?;
            Ok("success".to_string())
        }

        assert_eq!(inner().unwrap(), "success");
    }
}
