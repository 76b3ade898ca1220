use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, VoicelinkError};

/// Top-level configuration for the Voicelink coordination layer.
///
/// Loaded from `~/.voicelink/config.toml` by default. Both processes read
/// the same file; each section covers one component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoicelinkConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub extension: ExtensionConfig,
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub liveness: LivenessConfig,
}

impl VoicelinkConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: VoicelinkConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration, falling back to defaults if the file does not
    /// exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| VoicelinkError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// Shared store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the shared SQLite database both processes open.
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "~/.voicelink/shared.db".to_string(),
        }
    }
}

/// Extension-side state machine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionConfig {
    /// Poll period for the extension state machine, in milliseconds.
    pub poll_interval_ms: u64,
    /// How long the Error UI state is shown before auto-reset to Idle.
    pub error_recovery_secs: u64,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 300,
            error_recovery_secs: 3,
        }
    }
}

impl ExtensionConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn error_recovery(&self) -> Duration {
        Duration::from_secs(self.error_recovery_secs)
    }
}

/// Companion (host) processor settings.
///
/// The host polls more coarsely than the extension because its handlers
/// perform slow external calls (permission prompts, capture, cleanup).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Poll period for the host command processor, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
        }
    }
}

impl HostConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Liveness/wake settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessConfig {
    /// How long to wait for a readiness confirmation before proceeding
    /// optimistically.
    pub ready_timeout_secs: u64,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            ready_timeout_secs: 3,
        }
    }
}

impl LivenessConfig {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VoicelinkConfig::default();
        assert_eq!(config.extension.poll_interval_ms, 300);
        assert_eq!(config.extension.error_recovery_secs, 3);
        assert_eq!(config.host.poll_interval_ms, 500);
        assert_eq!(config.liveness.ready_timeout_secs, 3);
        assert_eq!(config.store.path, "~/.voicelink/shared.db");
    }

    #[test]
    fn test_durations() {
        let config = VoicelinkConfig::default();
        assert_eq!(
            config.extension.poll_interval(),
            Duration::from_millis(300)
        );
        assert_eq!(config.host.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.liveness.ready_timeout(), Duration::from_secs(3));
        assert_eq!(config.extension.error_recovery(), Duration::from_secs(3));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = VoicelinkConfig::default();
        config.host.poll_interval_ms = 750;
        config.store.path = "/tmp/voicelink-test.db".to_string();
        config.save(&path).unwrap();

        let loaded = VoicelinkConfig::load(&path).unwrap();
        assert_eq!(loaded.host.poll_interval_ms, 750);
        assert_eq!(loaded.store.path, "/tmp/voicelink-test.db");
        // Untouched sections keep their defaults.
        assert_eq!(loaded.extension.poll_interval_ms, 300);
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let config = VoicelinkConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.extension.poll_interval_ms, 300);
    }

    #[test]
    fn test_partial_toml_uses_section_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[extension]\npoll_interval_ms = 100\n").unwrap();

        let config = VoicelinkConfig::load(&path).unwrap();
        assert_eq!(config.extension.poll_interval_ms, 100);
        assert_eq!(config.extension.error_recovery_secs, 3);
        assert_eq!(config.host.poll_interval_ms, 500);
    }
}
