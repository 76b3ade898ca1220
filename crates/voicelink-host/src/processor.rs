//! The companion-side poll-driven command processor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use uuid::Uuid;

use voicelink_core::config::HostConfig;
use voicelink_core::types::{CommandKind, DictationSession};
use voicelink_store::SessionStore;

use crate::capture::CaptureProvider;
use crate::cleanup::CleanupProvider;

/// Claims one session at a time and services its commands.
///
/// `current_session_id` is the ownership token: the store has no atomic
/// compare-and-swap, so "at most one active session" holds because this
/// processor ignores any record whose id differs from its claim. Symmetric
/// to the staleness check on the extension side.
pub struct HostCommandProcessor<C: CaptureProvider, K: CleanupProvider> {
    store: Arc<dyn SessionStore>,
    capture: C,
    cleanup: K,
    config: HostConfig,
    current_session_id: Mutex<Option<Uuid>>,
    capturing: AtomicBool,
    shutdown: Arc<Notify>,
}

impl<C: CaptureProvider, K: CleanupProvider> HostCommandProcessor<C, K> {
    pub fn new(store: Arc<dyn SessionStore>, capture: C, cleanup: K, config: HostConfig) -> Self {
        Self {
            store,
            capture,
            cleanup,
            config,
            current_session_id: Mutex::new(None),
            capturing: AtomicBool::new(false),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// The session currently claimed, if any.
    pub fn current_session_id(&self) -> Option<Uuid> {
        *self
            .current_session_id
            .lock()
            .expect("claim mutex poisoned")
    }

    fn set_claim(&self, claim: Option<Uuid>) {
        *self
            .current_session_id
            .lock()
            .expect("claim mutex poisoned") = claim;
    }

    fn write_session(&self, session: &DictationSession) {
        if let Err(e) = self.store.set_session(session) {
            tracing::warn!(error = %e, command = %session.command, "Store write dropped");
        }
    }

    /// One poll tick: read the store and dispatch the current command.
    ///
    /// Public so tests can drive ticks deterministically; `run` calls this
    /// on the configured interval.
    pub async fn poll_once(&self) {
        let record = match self.store.session() {
            Ok(Some(record)) => record,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "Store read failed; treating as absent");
                return;
            }
        };

        let claim = self.current_session_id();

        // Ownership invariant: while a claim is held, commands for any
        // other session are ignored outright.
        if let Some(claimed) = claim {
            if record.session_id != claimed {
                tracing::trace!(
                    claimed = %claimed,
                    observed = %record.session_id,
                    "Record for unclaimed session ignored"
                );
                return;
            }
        }

        match record.command {
            CommandKind::ArmMic => self.handle_arm_mic(&record).await,
            CommandKind::StartRecording if claim == Some(record.session_id) => {
                self.handle_start_recording(&record).await
            }
            CommandKind::StopRecording if claim == Some(record.session_id) => {
                self.handle_stop_recording(&record).await
            }
            CommandKind::CancelRecording if claim == Some(record.session_id) => {
                self.handle_cancel(&record).await
            }
            // Superseded sessions (no matching claim), or steps this side
            // wrote itself and is not meant to act on.
            _ => {}
        }
    }

    /// `armMic`: acquire permissions, then confirm with `micReady`.
    async fn handle_arm_mic(&self, record: &DictationSession) {
        let id = record.session_id;
        tracing::info!(session_id = %id, "Arming microphone");

        let granted =
            self.capture.request_permissions().await && self.capture.request_mic_permission().await;

        if granted {
            self.set_claim(Some(id));
            self.write_session(&record.advanced(CommandKind::MicReady));
            tracing::info!(session_id = %id, "Session claimed; mic ready");
        } else {
            // Abandon: no claim is left behind.
            self.set_claim(None);
            self.write_session(&DictationSession::failed(id, "microphone permission denied"));
            tracing::warn!(session_id = %id, "Permission denied; session abandoned");
        }
    }

    /// `startRecording`: begin capture; on later polls while the record is
    /// unchanged, stream partial transcripts for live feedback.
    async fn handle_start_recording(&self, record: &DictationSession) {
        let id = record.session_id;

        if self.capturing.load(Ordering::SeqCst) {
            self.stream_partial();
            return;
        }

        match self.capture.start_capture().await {
            Ok(()) => {
                self.capturing.store(true, Ordering::SeqCst);
                tracing::info!(session_id = %id, "Capture started");
                self.stream_partial();
            }
            Err(e) => {
                tracing::warn!(session_id = %id, error = %e, "Capture failed to start");
                self.capturing.store(false, Ordering::SeqCst);
                self.set_claim(None);
                self.write_session(&DictationSession::failed(id, e.to_string()));
            }
        }
    }

    /// `stopRecording`: finish capture, report `processing`, run cleanup,
    /// and publish `cleanedText` + `textReady` (or `error`). Either outcome
    /// releases the claim.
    async fn handle_stop_recording(&self, record: &DictationSession) {
        let id = record.session_id;
        self.capturing.store(false, Ordering::SeqCst);

        let raw = match self.capture.stop_capture().await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(session_id = %id, error = %e, "Capture stop failed");
                self.set_claim(None);
                self.write_session(&DictationSession::failed(id, e.to_string()));
                return;
            }
        };

        if let Err(e) = self.store.set_raw_transcript(&raw) {
            tracing::warn!(error = %e, "Raw transcript write dropped");
        }
        self.write_session(&record.advanced(CommandKind::Processing));
        tracing::info!(session_id = %id, raw_len = raw.len(), "Cleaning transcript");

        let outcome = self.cleanup.cleanup(&raw).await;

        // A cancel observed while cleanup was in flight has released the
        // claim; a completed-but-cancelled cleanup result is dropped rather
        // than published as a late textReady.
        if self.current_session_id() != Some(id) {
            tracing::debug!(session_id = %id, "Cleanup finished after cancel; result dropped");
            return;
        }

        match outcome {
            Ok(text) => {
                if let Err(e) = self.store.set_cleaned_text(&text) {
                    tracing::warn!(error = %e, "Cleaned text write dropped");
                }
                self.write_session(&record.advanced(CommandKind::TextReady));
                tracing::info!(session_id = %id, text_len = text.len(), "Text ready");
            }
            Err(e) => {
                tracing::warn!(session_id = %id, error = %e, "Cleanup failed");
                self.write_session(&DictationSession::failed(id, e.to_string()));
            }
        }
        self.set_claim(None);
    }

    /// `cancelRecording`: stop capture if active, release the claim, write
    /// nothing back — the extension has already reset locally.
    async fn handle_cancel(&self, record: &DictationSession) {
        let id = record.session_id;
        if self.capturing.swap(false, Ordering::SeqCst) {
            if let Err(e) = self.capture.stop_capture().await {
                tracing::debug!(session_id = %id, error = %e, "Stop during cancel failed");
            }
        }
        self.set_claim(None);
        tracing::info!(session_id = %id, "Session cancelled; claim released");
    }

    fn stream_partial(&self) {
        if let Some(partial) = self.capture.partial_transcript() {
            if let Err(e) = self.store.set_raw_transcript(&partial) {
                tracing::debug!(error = %e, "Partial transcript write dropped");
            }
        }
    }

    /// Poll loop at the host period (default 0.5 s), coarser than the
    /// extension's because these handlers do the slow work.
    ///
    /// Returns on shutdown signal.
    pub async fn run(&self) {
        let mut interval = tokio::time::interval(self.config.poll_interval());
        loop {
            tokio::select! {
                _ = interval.tick() => self.poll_once().await,
                _ = self.shutdown.notified() => return,
            }
        }
    }

    /// Signal the poll loop to shut down gracefully.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}
