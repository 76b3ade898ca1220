//! Companion-side half of the liveness channel.

use std::sync::Arc;

use tokio::sync::Notify;

use voicelink_store::SessionStore;

use crate::channel::LivenessChannel;
use crate::signal::Signal;

/// Answers pings and announces foreground/background transitions.
///
/// Announcements also persist the `hostLiveness` store flag so a freshly
/// launched extension can seed its cached readiness before any signal
/// arrives.
pub struct LivenessResponder {
    channel: Arc<dyn LivenessChannel>,
    store: Arc<dyn SessionStore>,
    shutdown: Arc<Notify>,
}

impl LivenessResponder {
    pub fn new(channel: Arc<dyn LivenessChannel>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            channel,
            store,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Announce a host state transition over the channel and into the store.
    pub fn announce(&self, ready: bool) {
        self.channel.send(Signal::HostAppStateChanged { ready });
        if let Err(e) = self.store.set_host_ready(ready) {
            tracing::warn!(error = %e, "Liveness flag write dropped");
        }
        tracing::debug!(ready, "Host state announced");
    }

    /// Listener loop: replies `Pong` to every `Ping`.
    ///
    /// Legacy direct-command signals are acknowledged in logs only; the
    /// polling protocol carries the actual commands. Returns on shutdown
    /// signal.
    pub async fn run(&self) {
        let mut rx = self.channel.subscribe();
        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Ok(Signal::Ping) => {
                        self.channel.send(Signal::Pong);
                        tracing::trace!("Ping answered");
                    }
                    Ok(signal) if signal.is_legacy() => {
                        tracing::debug!(signal = ?signal, "Legacy direct-command signal ignored");
                    }
                    Ok(_) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::debug!(missed, "Responder lagged; signals dropped");
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::LoopbackChannel;
    use voicelink_store::MemoryStore;

    #[tokio::test]
    async fn test_ping_gets_pong() {
        let (ext_end, host_end) = LoopbackChannel::pair();
        let store = Arc::new(MemoryStore::new());
        let responder = Arc::new(LivenessResponder::new(
            Arc::new(host_end),
            store as Arc<dyn SessionStore>,
        ));

        let listener = {
            let responder = Arc::clone(&responder);
            tokio::spawn(async move { responder.run().await })
        };
        tokio::task::yield_now().await;

        let mut ext_rx = ext_end.subscribe();
        ext_end.send(Signal::Ping);
        assert_eq!(ext_rx.recv().await.unwrap(), Signal::Pong);

        responder.shutdown();
        listener.await.unwrap();
    }

    #[tokio::test]
    async fn test_announce_persists_flag() {
        let (_ext_end, host_end) = LoopbackChannel::pair();
        let store = Arc::new(MemoryStore::new());
        let responder =
            LivenessResponder::new(Arc::new(host_end), store.clone() as Arc<dyn SessionStore>);

        responder.announce(true);
        assert!(store.host_ready().unwrap());

        responder.announce(false);
        assert!(!store.host_ready().unwrap());
    }

    #[tokio::test]
    async fn test_legacy_signals_get_no_reply() {
        let (ext_end, host_end) = LoopbackChannel::pair();
        let store = Arc::new(MemoryStore::new());
        let responder = Arc::new(LivenessResponder::new(
            Arc::new(host_end),
            store as Arc<dyn SessionStore>,
        ));

        let listener = {
            let responder = Arc::clone(&responder);
            tokio::spawn(async move { responder.run().await })
        };
        tokio::task::yield_now().await;

        let mut ext_rx = ext_end.subscribe();
        ext_end.send(Signal::StartRecording);
        ext_end.send(Signal::Ping);
        // Only the ping produces a reply.
        assert_eq!(ext_rx.recv().await.unwrap(), Signal::Pong);

        responder.shutdown();
        listener.await.unwrap();
    }
}
