//! The extension-side poll-driven state machine.

use std::sync::Arc;
use std::sync::Mutex;

use tokio::sync::Notify;
use uuid::Uuid;

use voicelink_core::config::ExtensionConfig;
use voicelink_core::error::{Result, VoicelinkError};
use voicelink_core::types::{CommandKind, DictationSession};
use voicelink_liveness::{HostLivenessMonitor, Waker};
use voicelink_store::SessionStore;

use crate::sink::TextSink;
use crate::state::UiState;

/// Originates dictation sessions and drives the visible UI state.
///
/// All coordination with the companion happens through the shared store,
/// observed at poll boundaries; the liveness monitor is only a wake hint.
/// The primary race-prevention mechanism is the staleness check: any store
/// record whose session id differs from the locally tracked one is ignored
/// entirely.
///
/// There is deliberately no session-level timeout: if the companion never
/// becomes reachable, the machine stays in `Arming`/`Listening` until the
/// user cancels.
pub struct ExtensionStateMachine<W: Waker> {
    store: Arc<dyn SessionStore>,
    monitor: Arc<HostLivenessMonitor<W>>,
    sink: Arc<dyn TextSink>,
    config: ExtensionConfig,
    state: Mutex<UiState>,
    session_id: Mutex<Option<Uuid>>,
    error_since: Mutex<Option<tokio::time::Instant>>,
    shutdown: Arc<Notify>,
}

impl<W: Waker> ExtensionStateMachine<W> {
    pub fn new(
        store: Arc<dyn SessionStore>,
        monitor: Arc<HostLivenessMonitor<W>>,
        sink: Arc<dyn TextSink>,
        config: ExtensionConfig,
    ) -> Self {
        Self {
            store,
            monitor,
            sink,
            config,
            state: Mutex::new(UiState::Idle),
            session_id: Mutex::new(None),
            error_since: Mutex::new(None),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Current UI state, for the keyboard view to observe.
    pub fn ui_state(&self) -> UiState {
        self.state.lock().expect("state mutex poisoned").clone()
    }

    /// The session this machine currently considers active.
    pub fn current_session_id(&self) -> Option<Uuid> {
        *self.session_id.lock().expect("session mutex poisoned")
    }

    fn set_state(&self, next: UiState) {
        let mut state = self.state.lock().expect("state mutex poisoned");
        if *state != next {
            tracing::debug!("Extension state: {} -> {}", *state, next);
            *state = next;
        }
    }

    /// Begin a new dictation attempt.
    ///
    /// Writes `{armMic, sessionId, now}` to the store, asks the liveness
    /// layer to wake the companion (proceeding optimistically on timeout),
    /// and moves to `Arming`. Fails if a dictation is already underway.
    pub async fn start_dictation(&self) -> Result<Uuid> {
        {
            let state = self.state.lock().expect("state mutex poisoned");
            if state.is_active() {
                return Err(VoicelinkError::Session(format!(
                    "Cannot start dictation from {} state",
                    *state
                )));
            }
        }

        let session = DictationSession::armed();
        let id = session.session_id;
        if let Err(e) = self.store.set_session(&session) {
            tracing::warn!(error = %e, "Store write dropped for armMic");
        }

        *self.session_id.lock().expect("session mutex poisoned") = Some(id);
        self.set_state(UiState::Arming);
        tracing::info!(session_id = %id, "Dictation session started");

        // Wake is a hint; the armMic record is already in the store and the
        // companion will find it on its first poll either way.
        let confirmed = self.monitor.ensure_host_ready().await;
        if !confirmed {
            tracing::debug!(session_id = %id, "Host not confirmed ready; waiting on polls");
        }

        Ok(id)
    }

    /// Ask the companion to stop capturing and produce text.
    ///
    /// Writes `{stopRecording, sessionId, now}` and shows `Processing`.
    /// Only valid while `Listening`.
    pub fn stop_dictation(&self) -> Result<()> {
        {
            let state = self.state.lock().expect("state mutex poisoned");
            if *state != UiState::Listening {
                return Err(VoicelinkError::Session(format!(
                    "Cannot stop dictation from {} state",
                    *state
                )));
            }
        }
        let id = self
            .current_session_id()
            .ok_or_else(|| VoicelinkError::Session("No active session".to_string()))?;

        if let Err(e) = self
            .store
            .set_session(&DictationSession::command(id, CommandKind::StopRecording))
        {
            tracing::warn!(error = %e, "Store write dropped for stopRecording");
        }
        self.set_state(UiState::Processing);
        Ok(())
    }

    /// Abandon the current attempt, fire-and-forget.
    ///
    /// Writes `{cancelRecording, sessionId, now}` and resets to `Idle`
    /// immediately, without waiting for companion acknowledgment. The
    /// companion obeys opportunistically on its next poll. Responsiveness
    /// is chosen over cross-process consistency here on purpose.
    pub fn cancel_dictation(&self) -> Result<()> {
        let id = {
            let session = self.session_id.lock().expect("session mutex poisoned");
            match *session {
                Some(id) => id,
                None => {
                    return Err(VoicelinkError::Session(
                        "No active session to cancel".to_string(),
                    ))
                }
            }
        };

        if let Err(e) = self
            .store
            .set_session(&DictationSession::command(id, CommandKind::CancelRecording))
        {
            tracing::warn!(error = %e, "Store write dropped for cancelRecording");
        }

        *self.session_id.lock().expect("session mutex poisoned") = None;
        *self.error_since.lock().expect("error mutex poisoned") = None;
        self.set_state(UiState::Idle);
        tracing::info!(session_id = %id, "Dictation session cancelled");
        Ok(())
    }

    /// One poll tick: error auto-recovery, then store dispatch.
    ///
    /// Public so tests can drive ticks deterministically; `run` calls this
    /// on the configured interval.
    pub fn poll_once(&self) {
        self.recover_from_error();

        let Some(local_id) = self.current_session_id() else {
            return;
        };

        let record = match self.store.session() {
            Ok(Some(record)) => record,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "Store read failed; treating as absent");
                return;
            }
        };

        // Staleness check: a record for any other session is foreign and is
        // ignored entirely. This is what makes the unordered store safe.
        if record.session_id != local_id {
            tracing::trace!(
                local = %local_id,
                observed = %record.session_id,
                "Stale session record ignored"
            );
            return;
        }

        match record.command {
            CommandKind::MicReady => {
                // Auto-chain into recording so the user does not have to
                // trigger the second step manually.
                if let Err(e) = self
                    .store
                    .set_session(&record.advanced(CommandKind::StartRecording))
                {
                    tracing::warn!(error = %e, "Store write dropped for startRecording");
                }
                self.set_state(UiState::Listening);
            }
            CommandKind::Processing => {
                self.set_state(UiState::Processing);
            }
            CommandKind::TextReady => {
                self.consume_text(local_id);
            }
            CommandKind::Error => {
                let message = record
                    .error
                    .unwrap_or_else(|| "unknown companion error".to_string());
                tracing::warn!(session_id = %local_id, error = %message, "Companion reported failure");
                // Abandon the session; the stale record in the store will be
                // overwritten by the next attempt.
                *self.session_id.lock().expect("session mutex poisoned") = None;
                *self.error_since.lock().expect("error mutex poisoned") =
                    Some(tokio::time::Instant::now());
                self.set_state(UiState::Error(message));
            }
            // Our own writes, or steps the companion is still working on.
            CommandKind::ArmMic
            | CommandKind::StartRecording
            | CommandKind::StopRecording
            | CommandKind::CancelRecording => {}
        }
    }

    /// Consume `textReady`: insert once, then tear the session down.
    ///
    /// The local session id is cleared before any other effect so that a
    /// duplicate observation of the same record (a poll racing the store
    /// clear) fails the staleness check and becomes a no-op.
    fn consume_text(&self, id: Uuid) {
        *self.session_id.lock().expect("session mutex poisoned") = None;

        let text = match self.store.cleaned_text() {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "Cleaned text unreadable; nothing to insert");
                None
            }
        };

        match text {
            Some(text) if !text.is_empty() => {
                if let Err(e) = self.sink.insert(&text) {
                    tracing::warn!(error = %e, "Text insertion failed");
                } else {
                    tracing::info!(session_id = %id, text_len = text.len(), "Dictated text inserted");
                }
            }
            _ => tracing::debug!(session_id = %id, "textReady with empty cleaned text"),
        }

        if let Err(e) = self.store.clear_session() {
            tracing::warn!(error = %e, "Session clear dropped");
        }
        if let Err(e) = self.store.clear_text() {
            tracing::warn!(error = %e, "Text clear dropped");
        }
        self.set_state(UiState::Idle);
    }

    fn recover_from_error(&self) {
        let expired = {
            let since = self.error_since.lock().expect("error mutex poisoned");
            match *since {
                Some(at) => at.elapsed() >= self.config.error_recovery(),
                None => return,
            }
        };
        if expired {
            *self.error_since.lock().expect("error mutex poisoned") = None;
            self.set_state(UiState::Idle);
            tracing::debug!("Error state auto-recovered to Idle");
        }
    }

    /// Poll loop at the extension period (default 0.3 s).
    ///
    /// Returns on shutdown signal.
    pub async fn run(&self) {
        let mut interval = tokio::time::interval(self.config.poll_interval());
        loop {
            tokio::select! {
                _ = interval.tick() => self.poll_once(),
                _ = self.shutdown.notified() => return,
            }
        }
    }

    /// Signal the poll loop to shut down gracefully.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}
