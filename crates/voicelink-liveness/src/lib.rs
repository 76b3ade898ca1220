//! Voicelink Liveness crate - best-effort wake and reachability signals.
//!
//! The signal channel exists only to estimate whether the companion process
//! is currently running and to wake it; it never carries protocol commands.
//! Signals to a backgrounded or sandboxed process can be silently dropped,
//! so nothing here is authoritative — the polling protocol over the shared
//! store stays correct even if every signal is lost.

pub mod channel;
pub mod monitor;
pub mod responder;
pub mod signal;
pub mod waker;

pub use channel::{LivenessChannel, LoopbackChannel};
pub use monitor::HostLivenessMonitor;
pub use responder::LivenessResponder;
pub use signal::Signal;
pub use waker::{NullWaker, Waker};
