//! Text cleanup collaborator seam.

use voicelink_core::error::{Result, VoicelinkError};

/// The on-device model that turns a raw transcript into clean text.
pub trait CleanupProvider: Send + Sync {
    /// Clean up a raw transcript.
    ///
    /// Fails with `CleanupUnavailable` when the model cannot be loaded and
    /// `CleanupFailed` when inference itself errors.
    fn cleanup(&self, raw: &str) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// Scripted cleanup double.
#[derive(Debug, Clone)]
pub struct MockCleanupProvider {
    mode: Mode,
}

#[derive(Debug, Clone)]
enum Mode {
    /// Return the raw text with whitespace collapsed, like a trivial model.
    Tidy,
    /// Always return this exact text.
    Fixed(String),
    /// Fail with `CleanupUnavailable`.
    Unavailable,
    /// Fail with `CleanupFailed`.
    Failing,
}

impl Default for MockCleanupProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCleanupProvider {
    pub fn new() -> Self {
        Self { mode: Mode::Tidy }
    }

    pub fn fixed(text: &str) -> Self {
        Self {
            mode: Mode::Fixed(text.to_string()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            mode: Mode::Unavailable,
        }
    }

    pub fn failing() -> Self {
        Self { mode: Mode::Failing }
    }
}

impl CleanupProvider for MockCleanupProvider {
    async fn cleanup(&self, raw: &str) -> Result<String> {
        match &self.mode {
            Mode::Tidy => Ok(raw.split_whitespace().collect::<Vec<_>>().join(" ")),
            Mode::Fixed(text) => Ok(text.clone()),
            Mode::Unavailable => Err(VoicelinkError::CleanupUnavailable(
                "model not loaded".to_string(),
            )),
            Mode::Failing => Err(VoicelinkError::CleanupFailed(
                "inference failed".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tidy_collapses_whitespace() {
        let cleanup = MockCleanupProvider::new();
        let out = cleanup.cleanup("  hello   world \n").await.unwrap();
        assert_eq!(out, "hello world");
    }

    #[tokio::test]
    async fn test_fixed_ignores_input() {
        let cleanup = MockCleanupProvider::fixed("canned");
        assert_eq!(cleanup.cleanup("anything").await.unwrap(), "canned");
    }

    #[tokio::test]
    async fn test_failure_modes() {
        let err = MockCleanupProvider::unavailable()
            .cleanup("x")
            .await
            .unwrap_err();
        assert!(matches!(err, VoicelinkError::CleanupUnavailable(_)));

        let err = MockCleanupProvider::failing().cleanup("x").await.unwrap_err();
        assert!(matches!(err, VoicelinkError::CleanupFailed(_)));
    }
}
