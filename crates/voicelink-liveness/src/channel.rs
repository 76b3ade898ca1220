//! The signal transport capability and its in-process implementation.

use tokio::sync::broadcast;

use crate::signal::Signal;

/// Capacity of the loopback buffers. Signals beyond this are dropped,
/// mirroring the lossy platform notification mechanism.
const CHANNEL_CAPACITY: usize = 16;

/// Best-effort signal transport between the two processes.
///
/// `send` never fails and never blocks; a signal sent while the peer is not
/// listening is simply lost. Implementations wrap whatever lossy platform
/// notification mechanism is available.
pub trait LivenessChannel: Send + Sync {
    /// Fire a signal at the peer, best-effort.
    fn send(&self, signal: Signal);

    /// Subscribe to signals arriving from the peer.
    ///
    /// Each subscriber gets its own receiver; signals sent before
    /// subscription are not replayed.
    fn subscribe(&self) -> broadcast::Receiver<Signal>;
}

/// In-process channel endpoint connecting two cooperating components.
///
/// `LoopbackChannel::pair()` returns the extension-side and host-side
/// endpoints of one bidirectional link. Used by tests and by the demo
/// binary, where both state machines run in a single process.
pub struct LoopbackChannel {
    outgoing: broadcast::Sender<Signal>,
    incoming: broadcast::Sender<Signal>,
}

impl LoopbackChannel {
    /// Create a connected pair of endpoints.
    pub fn pair() -> (LoopbackChannel, LoopbackChannel) {
        let (a_to_b, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (b_to_a, _) = broadcast::channel(CHANNEL_CAPACITY);

        let a = LoopbackChannel {
            outgoing: a_to_b.clone(),
            incoming: b_to_a.clone(),
        };
        let b = LoopbackChannel {
            outgoing: b_to_a,
            incoming: a_to_b,
        };
        (a, b)
    }
}

impl LivenessChannel for LoopbackChannel {
    fn send(&self, signal: Signal) {
        // A send with no live receiver is a dropped signal, by contract.
        if self.outgoing.send(signal.clone()).is_err() {
            tracing::trace!(signal = ?signal, "Signal dropped: no receiver");
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<Signal> {
        self.incoming.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pair_is_cross_wired() {
        let (ext, host) = LoopbackChannel::pair();

        let mut host_rx = host.subscribe();
        ext.send(Signal::Ping);
        assert_eq!(host_rx.recv().await.unwrap(), Signal::Ping);

        let mut ext_rx = ext.subscribe();
        host.send(Signal::Pong);
        assert_eq!(ext_rx.recv().await.unwrap(), Signal::Pong);
    }

    #[tokio::test]
    async fn test_send_without_receiver_is_silent() {
        let (ext, _host) = LoopbackChannel::pair();
        // No subscriber on the host side; must not panic or error.
        ext.send(Signal::Ping);
        ext.send(Signal::HostAppStateChanged { ready: true });
    }

    #[tokio::test]
    async fn test_signals_before_subscription_are_lost() {
        let (ext, host) = LoopbackChannel::pair();
        ext.send(Signal::Ping);

        let mut host_rx = host.subscribe();
        ext.send(Signal::Pong);
        // Only the post-subscription signal arrives.
        assert_eq!(host_rx.recv().await.unwrap(), Signal::Pong);
        assert!(matches!(
            host_rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }
}
