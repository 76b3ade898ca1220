//! End-to-end protocol tests.
//!
//! Both state machines run against one shared in-memory store, with test
//! code standing in for the two schedulers: every `poll_once` call is one
//! tick of the owning process. This makes the interleavings explicit and
//! deterministic, which is exactly how the staleness and idempotence
//! guarantees need to be exercised.

use std::sync::Arc;
use std::time::Duration;

use voicelink_core::config::{ExtensionConfig, HostConfig, LivenessConfig};
use voicelink_core::types::{CommandKind, DictationSession};
use voicelink_extension::{CollectingSink, ExtensionStateMachine, TextSink, UiState};
use voicelink_host::{
    HostCommandProcessor, MockCaptureProvider, MockCleanupProvider,
};
use voicelink_liveness::{HostLivenessMonitor, LoopbackChannel, NullWaker};
use voicelink_store::{MemoryStore, SessionStore};

struct World {
    store: Arc<MemoryStore>,
    extension: ExtensionStateMachine<NullWaker>,
    host: HostCommandProcessor<MockCaptureProvider, MockCleanupProvider>,
    sink: Arc<CollectingSink>,
}

fn world(capture: MockCaptureProvider, cleanup: MockCleanupProvider) -> World {
    let store = Arc::new(MemoryStore::new());
    // The companion counts as running; the wake path is covered by the
    // liveness crate's own tests.
    store.set_host_ready(true).unwrap();

    let (ext_end, _host_end) = LoopbackChannel::pair();
    let monitor = Arc::new(HostLivenessMonitor::new(
        Arc::new(ext_end),
        store.as_ref(),
        NullWaker,
        LivenessConfig::default().ready_timeout(),
    ));
    let sink = Arc::new(CollectingSink::new());
    let extension = ExtensionStateMachine::new(
        store.clone() as Arc<dyn SessionStore>,
        monitor,
        sink.clone() as Arc<dyn TextSink>,
        ExtensionConfig::default(),
    );
    let host = HostCommandProcessor::new(
        store.clone() as Arc<dyn SessionStore>,
        capture,
        cleanup,
        HostConfig::default(),
    );
    World {
        store,
        extension,
        host,
        sink,
    }
}

#[tokio::test]
async fn scenario_a_start_dictation_writes_arm_mic() {
    let w = world(MockCaptureProvider::new(), MockCleanupProvider::new());

    let id = w.extension.start_dictation().await.unwrap();

    let record = w.store.session().unwrap().unwrap();
    assert_eq!(record.command, CommandKind::ArmMic);
    assert_eq!(record.session_id, id);
    assert_eq!(w.extension.ui_state(), UiState::Arming);
}

#[tokio::test]
async fn scenario_b_mic_ready_moves_to_listening() {
    let w = world(MockCaptureProvider::new(), MockCleanupProvider::new());

    let id = w.extension.start_dictation().await.unwrap();
    w.host.poll_once().await;

    let record = w.store.session().unwrap().unwrap();
    assert_eq!(record.command, CommandKind::MicReady);
    assert_eq!(record.session_id, id);

    w.extension.poll_once();
    assert_eq!(w.extension.ui_state(), UiState::Listening);
    let record = w.store.session().unwrap().unwrap();
    assert_eq!(record.command, CommandKind::StartRecording);
    assert_eq!(record.session_id, id);
}

#[tokio::test]
async fn scenario_c_claimed_host_ignores_foreign_start() {
    let w = world(MockCaptureProvider::new(), MockCleanupProvider::new());

    w.extension.start_dictation().await.unwrap();
    w.host.poll_once().await; // claim

    let foreign = DictationSession::command(uuid::Uuid::new_v4(), CommandKind::StartRecording);
    w.store.set_session(&foreign).unwrap();
    w.host.poll_once().await;

    // Store left unchanged by the processor.
    assert_eq!(w.store.session().unwrap(), Some(foreign));
}

#[tokio::test(start_paused = true)]
async fn scenario_d_cleanup_failure_surfaces_then_recovers() {
    let w = world(MockCaptureProvider::new(), MockCleanupProvider::unavailable());

    w.extension.start_dictation().await.unwrap();
    w.host.poll_once().await; // micReady
    w.extension.poll_once(); // startRecording + Listening
    w.host.poll_once().await; // capture running
    w.extension.stop_dictation().unwrap();
    w.host.poll_once().await; // stop + cleanup fails

    let record = w.store.session().unwrap().unwrap();
    assert_eq!(record.command, CommandKind::Error);

    w.extension.poll_once();
    assert!(matches!(w.extension.ui_state(), UiState::Error(_)));

    tokio::time::advance(Duration::from_millis(3100)).await;
    w.extension.poll_once();
    assert_eq!(w.extension.ui_state(), UiState::Idle);
    assert!(w.sink.inserted().is_empty());
}

#[tokio::test]
async fn scenario_e_cancel_resets_extension_before_host_notices() {
    let w = world(MockCaptureProvider::new(), MockCleanupProvider::new());

    w.extension.start_dictation().await.unwrap();
    w.host.poll_once().await;
    w.extension.poll_once();
    w.host.poll_once().await;
    assert_eq!(w.extension.ui_state(), UiState::Listening);

    w.extension.cancel_dictation().unwrap();
    // Immediate local reset, host has not polled yet.
    assert_eq!(w.extension.ui_state(), UiState::Idle);
    assert!(w.host.current_session_id().is_some());

    // Host obeys opportunistically on its next tick.
    w.host.poll_once().await;
    assert!(w.host.current_session_id().is_none());
}

#[tokio::test]
async fn full_happy_path_inserts_cleaned_text_once() {
    let w = world(
        MockCaptureProvider::with_transcript("um  hello   world"),
        MockCleanupProvider::fixed("Hello world."),
    );

    w.extension.start_dictation().await.unwrap();
    w.host.poll_once().await; // armMic -> micReady
    w.extension.poll_once(); // micReady -> startRecording, Listening
    w.host.poll_once().await; // capture starts
    assert_eq!(w.extension.ui_state(), UiState::Listening);

    w.extension.stop_dictation().unwrap();
    assert_eq!(w.extension.ui_state(), UiState::Processing);

    w.host.poll_once().await; // stop, cleanup, textReady
    let record = w.store.session().unwrap().unwrap();
    assert_eq!(record.command, CommandKind::TextReady);
    assert_eq!(
        w.store.raw_transcript().unwrap().as_deref(),
        Some("um  hello   world")
    );

    w.extension.poll_once(); // insert + teardown
    assert_eq!(w.sink.inserted(), vec!["Hello world."]);
    assert_eq!(w.extension.ui_state(), UiState::Idle);
    assert!(w.store.session().unwrap().is_none());
    assert!(w.store.cleaned_text().unwrap().is_none());

    // Extra extension ticks change nothing (duplicate-consumption guard).
    w.extension.poll_once();
    w.extension.poll_once();
    assert_eq!(w.sink.inserted(), vec!["Hello world."]);
}

#[tokio::test]
async fn stale_records_ignored_on_both_sides() {
    let w = world(MockCaptureProvider::new(), MockCleanupProvider::new());

    let id = w.extension.start_dictation().await.unwrap();
    w.host.poll_once().await; // claim id

    // A record bearing a different session id is invisible to both sides.
    let other = DictationSession::command(uuid::Uuid::new_v4(), CommandKind::TextReady);
    w.store.set_cleaned_text("should not appear").unwrap();
    w.store.set_session(&other).unwrap();

    w.extension.poll_once();
    w.host.poll_once().await;

    assert!(w.sink.inserted().is_empty());
    assert_eq!(w.extension.ui_state(), UiState::Arming);
    assert_eq!(w.host.current_session_id(), Some(id));
    assert_eq!(w.store.session().unwrap(), Some(other));
}

#[tokio::test]
async fn back_to_back_sessions_reuse_nothing() {
    let w = world(
        MockCaptureProvider::with_transcript("take one"),
        MockCleanupProvider::new(),
    );

    let first = w.extension.start_dictation().await.unwrap();
    w.host.poll_once().await;
    w.extension.poll_once();
    w.host.poll_once().await;
    w.extension.stop_dictation().unwrap();
    w.host.poll_once().await;
    w.extension.poll_once();
    assert_eq!(w.sink.inserted(), vec!["take one"]);

    let second = w.extension.start_dictation().await.unwrap();
    assert_ne!(first, second);
    w.host.poll_once().await;
    w.extension.poll_once();
    assert_eq!(w.extension.ui_state(), UiState::Listening);
    assert_eq!(w.host.current_session_id(), Some(second));
}

#[tokio::test]
async fn store_outage_mid_session_is_survivable() {
    let w = world(MockCaptureProvider::new(), MockCleanupProvider::new());

    w.extension.start_dictation().await.unwrap();
    w.store.set_unavailable(true);

    // Both sides keep ticking through the outage.
    w.host.poll_once().await;
    w.extension.poll_once();
    assert_eq!(w.extension.ui_state(), UiState::Arming);
    assert!(w.host.current_session_id().is_none());

    w.store.set_unavailable(false);
    w.host.poll_once().await;
    w.extension.poll_once();
    assert_eq!(w.extension.ui_state(), UiState::Listening);
}
