//! Audio capture collaborator seam.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use voicelink_core::error::{Result, VoicelinkError};

/// Service owning microphone access and speech decoding.
///
/// Implementations wrap the platform capture/recognition stack; the
/// processor only ever talks to this trait. All calls may suspend for a
/// long time (permission prompts block on the user).
pub trait CaptureProvider: Send + Sync {
    /// Request speech-recognition permission. True means granted.
    fn request_permissions(&self) -> impl std::future::Future<Output = bool> + Send;

    /// Request microphone permission. True means granted.
    fn request_mic_permission(&self) -> impl std::future::Future<Output = bool> + Send;

    /// Begin capturing audio.
    fn start_capture(&self) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Stop capturing and return the final raw transcript.
    fn stop_capture(&self) -> impl std::future::Future<Output = Result<String>> + Send;

    /// Best-effort partial transcript since the last call, for live
    /// feedback. `None` when nothing new is available.
    fn partial_transcript(&self) -> Option<String>;
}

/// Deterministic capture double for tests and the demo.
///
/// Scripted with a final transcript and optional partial chunks; can be
/// told to deny permissions or fail capture calls.
#[derive(Debug)]
pub struct MockCaptureProvider {
    transcript: String,
    partials: Mutex<Vec<String>>,
    grant_permissions: bool,
    fail_start: bool,
    capturing: AtomicBool,
    start_calls: AtomicUsize,
    stop_calls: AtomicUsize,
}

impl Default for MockCaptureProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCaptureProvider {
    /// Granting, non-failing provider with a default transcript.
    pub fn new() -> Self {
        Self {
            transcript: "mock transcript".to_string(),
            partials: Mutex::new(Vec::new()),
            grant_permissions: true,
            fail_start: false,
            capturing: AtomicBool::new(false),
            start_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
        }
    }

    /// Provider whose final transcript is `transcript`.
    pub fn with_transcript(transcript: &str) -> Self {
        Self {
            transcript: transcript.to_string(),
            ..Self::new()
        }
    }

    /// Provider that refuses both permission requests.
    pub fn denying() -> Self {
        Self {
            grant_permissions: false,
            ..Self::new()
        }
    }

    /// Provider whose `start_capture` fails.
    pub fn failing_start() -> Self {
        Self {
            fail_start: true,
            ..Self::new()
        }
    }

    /// Queue partial chunks returned one per `partial_transcript` call.
    pub fn queue_partials(&self, chunks: &[&str]) {
        let mut partials = self.partials.lock().expect("partials mutex poisoned");
        // Drained from the front, so store in reverse.
        for chunk in chunks.iter().rev() {
            partials.push(chunk.to_string());
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

impl CaptureProvider for MockCaptureProvider {
    async fn request_permissions(&self) -> bool {
        self.grant_permissions
    }

    async fn request_mic_permission(&self) -> bool {
        self.grant_permissions
    }

    async fn start_capture(&self) -> Result<()> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_start {
            return Err(VoicelinkError::CaptureStart(
                "audio engine failed to start".to_string(),
            ));
        }
        self.capturing.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop_capture(&self) -> Result<String> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        if !self.capturing.swap(false, Ordering::SeqCst) {
            return Err(VoicelinkError::Capture("capture was not running".to_string()));
        }
        Ok(self.transcript.clone())
    }

    fn partial_transcript(&self) -> Option<String> {
        self.partials.lock().expect("partials mutex poisoned").pop()
    }
}
