//! The platform wake capability.

/// Mechanism that brings the companion process to the foreground.
///
/// On the real platform this is a custom URL-style activation request with
/// a completion callback; here it is a capability trait so the extension
/// state machine can be tested with a recording double.
pub trait Waker: Send + Sync {
    /// Request activation of the companion process.
    ///
    /// Resolves to whether the activation request was accepted. Acceptance
    /// does not mean the companion has finished launching — readiness is
    /// confirmed separately over the liveness channel.
    fn wake(&self) -> impl std::future::Future<Output = bool> + Send;
}

/// Waker that does nothing and reports failure.
///
/// Used where no activation mechanism exists (tests, the single-process
/// demo where the host is already running).
#[derive(Debug, Clone, Default)]
pub struct NullWaker;

impl Waker for NullWaker {
    async fn wake(&self) -> bool {
        false
    }
}
