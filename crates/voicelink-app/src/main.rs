//! Voicelink binary - composition root.
//!
//! Wires both halves of the coordination layer into one process for
//! development and manual testing:
//! 1. Load configuration from TOML
//! 2. Open the shared store (SQLite, or in-memory for --demo)
//! 3. Connect the two liveness endpoints over a loopback channel
//! 4. Start the host command processor, liveness responder, host liveness
//!    monitor, and extension poll loops
//! 5. With --demo, drive one scripted dictation end to end and print the
//!    inserted text
//!
//! In production each half runs in its own process against the same store
//! file; the wiring below is identical apart from the channel transport.

mod cli;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use voicelink_core::config::VoicelinkConfig;
use voicelink_core::error::{Result, VoicelinkError};
use voicelink_extension::{CollectingSink, ExtensionStateMachine, UiState};
use voicelink_host::{HostCommandProcessor, MockCaptureProvider, MockCleanupProvider};
use voicelink_liveness::{HostLivenessMonitor, LivenessResponder, LoopbackChannel, NullWaker};
use voicelink_store::{MemoryStore, SessionStore, SqliteStore};

use cli::CliArgs;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    let config = VoicelinkConfig::load_or_default(&args.resolve_config_path());

    let filter = match args.resolve_log_level() {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let store: Arc<dyn SessionStore> = if args.demo {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(SqliteStore::open(&args.resolve_store_path(
            &config.store.path,
        ))?)
    };

    // Liveness plumbing: loopback in-process, since both halves live here.
    let (ext_end, host_end) = LoopbackChannel::pair();
    let responder = Arc::new(LivenessResponder::new(Arc::new(host_end), store.clone()));
    let monitor = Arc::new(HostLivenessMonitor::new(
        Arc::new(ext_end),
        store.as_ref(),
        NullWaker,
        config.liveness.ready_timeout(),
    ));

    let sink = Arc::new(CollectingSink::new());
    let extension = Arc::new(ExtensionStateMachine::new(
        store.clone(),
        monitor.clone(),
        sink.clone(),
        config.extension.clone(),
    ));

    let capture = MockCaptureProvider::with_transcript("so um   this is a  voicelink dictation");
    let processor = Arc::new(HostCommandProcessor::new(
        store.clone(),
        capture,
        MockCleanupProvider::new(),
        config.host.clone(),
    ));

    let mut tasks = Vec::new();
    tasks.push(tokio::spawn({
        let responder = Arc::clone(&responder);
        async move { responder.run().await }
    }));
    tasks.push(tokio::spawn({
        let monitor = Arc::clone(&monitor);
        async move { monitor.run().await }
    }));
    tasks.push(tokio::spawn({
        let processor = Arc::clone(&processor);
        async move { processor.run().await }
    }));
    tasks.push(tokio::spawn({
        let extension = Arc::clone(&extension);
        async move { extension.run().await }
    }));

    // The companion is up: let the extension side know.
    responder.announce(true);
    tracing::info!("Voicelink running (extension + host in one process)");

    if args.demo {
        run_demo(&extension, &sink).await?;
    } else {
        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutting down");
    }

    responder.announce(false);
    extension.shutdown();
    processor.shutdown();
    monitor.shutdown();
    responder.shutdown();
    for task in tasks {
        let _ = task.await;
    }
    Ok(())
}

/// Drive one dictation through the full protocol and print the result.
async fn run_demo(
    extension: &ExtensionStateMachine<NullWaker>,
    sink: &CollectingSink,
) -> Result<()> {
    let id = extension.start_dictation().await?;
    tracing::info!(session_id = %id, "Demo dictation started");

    wait_for_state(extension, |s| *s == UiState::Listening).await?;
    // "Speak" for a moment, then stop.
    tokio::time::sleep(Duration::from_millis(800)).await;
    extension.stop_dictation()?;

    wait_for_state(extension, |s| *s == UiState::Idle).await?;

    match sink.inserted().first() {
        Some(text) => println!("Inserted: {}", text),
        None => println!("No text inserted"),
    }
    Ok(())
}

async fn wait_for_state(
    extension: &ExtensionStateMachine<NullWaker>,
    predicate: impl Fn(&UiState) -> bool,
) -> Result<()> {
    // Generous bound; the poll loops normally settle within a few ticks.
    for _ in 0..100 {
        let state = extension.ui_state();
        if predicate(&state) {
            return Ok(());
        }
        if let UiState::Error(message) = state {
            return Err(VoicelinkError::Session(message));
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    Err(VoicelinkError::Session(
        "demo timed out waiting for state change".to_string(),
    ))
}
