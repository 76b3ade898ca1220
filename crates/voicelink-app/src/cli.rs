//! CLI argument definitions for the Voicelink binary.
//!
//! Uses `clap` with derive macros. Priority resolution:
//! CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Voicelink — cross-process dictation coordination over a shared store.
#[derive(Parser, Debug)]
#[command(name = "voicelink", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Path to the shared store database.
    #[arg(short = 's', long = "store")]
    pub store: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Run one scripted dictation against an in-memory store and exit.
    #[arg(long = "demo")]
    pub demo: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > VOICELINK_CONFIG env var > ~/.voicelink/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("VOICELINK_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the store path (expand ~ to home).
    ///
    /// Priority: --store flag > config file value.
    pub fn resolve_store_path(&self, config_path: &str) -> PathBuf {
        match self.store {
            Some(ref p) => p.clone(),
            None => expand_home(config_path),
        }
    }

    /// Resolve the log level. `None` means use the RUST_LOG env default.
    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }
}

fn default_config_path() -> PathBuf {
    PathBuf::from(home_dir()).join(".voicelink").join("config.toml")
}

fn home_dir() -> String {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string())
}

/// Expand a leading `~/` to the home directory.
///
/// The config default (`~/.voicelink/shared.db`) would otherwise be taken
/// literally and create a `~` directory under the working directory.
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        PathBuf::from(home_dir()).join(rest)
    } else {
        PathBuf::from(path)
    }
}
