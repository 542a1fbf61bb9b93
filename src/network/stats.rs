//! Server counters
//!
//! Lock-free counters updated by the accept loop and the worker tasks.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct ServerStats {
    accepted: AtomicU64,
    dispatched: AtomicU64,
    served: AtomicU64,
    handshakes: AtomicU64,
    handshake_failures: AtomicU64,
    rejected: AtomicU64,
}

/// Point-in-time copy of [`ServerStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Connections returned by accept
    pub accepted: u64,
    /// Connections handed to the worker pool
    pub dispatched: u64,
    /// Connections whose task finished
    pub served: u64,
    /// TLS handshakes attempted
    pub handshakes: u64,
    /// TLS handshakes that failed
    pub handshake_failures: u64,
    /// Accepted connections dropped before dispatch (socket setup failure)
    pub rejected: u64,
}

impl ServerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_served(&self) {
        self.served.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_handshake(&self) {
        self.handshakes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_handshake_failure(&self) {
        self.handshake_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            served: self.served.load(Ordering::Relaxed),
            handshakes: self.handshakes.load(Ordering::Relaxed),
            handshake_failures: self.handshake_failures.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}
