//! Extension-side reachability estimate for the companion process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use voicelink_store::SessionStore;

use crate::channel::LivenessChannel;
use crate::signal::Signal;
use crate::waker::Waker;

/// Caches a best-effort "companion ready" flag on the extension side.
///
/// The cache is fed by `Pong` replies and proactive
/// `HostAppStateChanged` announcements, and seeded opportunistically from
/// the persisted store flag. It is a hint, never authoritative: commands
/// are written to the store regardless of what the cache says.
pub struct HostLivenessMonitor<W: Waker> {
    channel: Arc<dyn LivenessChannel>,
    waker: W,
    ready: AtomicBool,
    ready_timeout: Duration,
    shutdown: Arc<Notify>,
}

impl<W: Waker> HostLivenessMonitor<W> {
    /// Create a monitor, seeding the cached flag from the persisted
    /// `hostLiveness` store value (absent or unreadable means not ready).
    pub fn new(
        channel: Arc<dyn LivenessChannel>,
        store: &dyn SessionStore,
        waker: W,
        ready_timeout: Duration,
    ) -> Self {
        let seeded = store.host_ready().unwrap_or(false);
        Self {
            channel,
            waker,
            ready: AtomicBool::new(seeded),
            ready_timeout,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Current cached readiness. Approximate by design.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Background listener keeping the cached flag approximately fresh.
    ///
    /// Returns on shutdown signal.
    pub async fn run(&self) {
        let mut rx = self.channel.subscribe();
        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Ok(signal) => self.observe(&signal),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::debug!(missed, "Liveness listener lagged; signals dropped");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => return,
                },
                _ = self.shutdown.notified() => return,
            }
        }
    }

    /// Signal the listener to shut down.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    fn observe(&self, signal: &Signal) {
        match signal {
            Signal::Pong => {
                self.ready.store(true, Ordering::SeqCst);
                tracing::debug!("Pong received; host marked ready");
            }
            Signal::HostAppStateChanged { ready } => {
                self.ready.store(*ready, Ordering::SeqCst);
                tracing::debug!(ready, "Host app state change observed");
            }
            legacy if legacy.is_legacy() => {
                tracing::debug!(signal = ?legacy, "Legacy direct-command signal ignored");
            }
            _ => {}
        }
    }

    /// Confirm the companion is reachable before sending it work.
    ///
    /// If the cached flag is already true this resolves immediately.
    /// Otherwise it pings, triggers the platform wake mechanism, and waits
    /// up to the configured timeout for a readiness confirmation. Returns
    /// whether readiness was confirmed; on `false` the caller proceeds
    /// optimistically and writes its command anyway — absence of a pong is
    /// "unknown", not an error.
    pub async fn ensure_host_ready(&self) -> bool {
        if self.is_ready() {
            return true;
        }

        // Subscribe before pinging so the reply cannot slip past us.
        let mut rx = self.channel.subscribe();
        self.channel.send(Signal::Ping);

        let woke = self.waker.wake().await;
        tracing::debug!(activation_accepted = woke, "Host wake requested");

        let deadline = tokio::time::Instant::now() + self.ready_timeout;
        loop {
            let wait = tokio::time::timeout_at(deadline, rx.recv());
            match wait.await {
                Ok(Ok(Signal::Pong)) | Ok(Ok(Signal::HostAppStateChanged { ready: true })) => {
                    self.ready.store(true, Ordering::SeqCst);
                    return true;
                }
                Ok(Ok(_)) => continue,
                Ok(Err(_)) => return false,
                Err(_) => {
                    tracing::debug!(
                        timeout_secs = self.ready_timeout.as_secs(),
                        "No readiness confirmation; proceeding optimistically"
                    );
                    return false;
                }
            }
        }
    }
}
