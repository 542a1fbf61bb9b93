//! Condvar-backed gate
//!
//! One mutex protects both the admitted count and the drain flag, so a
//! caller can never slip in between `request_drain()` and the count check.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::{Admission, AdmissionGate, GateState};

#[derive(Debug, Default)]
struct GateInner {
    /// Callers between enter() and leave()
    admitted: usize,

    /// Set by request_drain(), cleared by reopen()
    draining: bool,
}

/// Process-wide admission gate
///
/// ## Concurrency:
/// - `inner`: count and drain flag, always updated under the same lock
/// - `opened`: wakes callers parked in `enter()` when the gate reopens
/// - `drained`: wakes `await_drained()` when the last caller leaves
#[derive(Debug, Default)]
pub struct Gate {
    inner: Mutex<GateInner>,
    opened: Condvar,
    drained: Condvar,
}

impl Gate {
    /// Create an open gate with no admitted callers
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the gate and get a guard that leaves on drop
    pub fn admit(&self) -> Admission<'_, Gate> {
        Admission::acquire(self)
    }

    /// Admit the caller only if the gate is open right now
    pub fn try_enter(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.draining {
            return false;
        }
        inner.admitted += 1;
        true
    }

    /// Non-blocking variant of [`Gate::admit`]
    pub fn try_admit(&self) -> Option<Admission<'_, Gate>> {
        if self.try_enter() {
            Some(Admission::adopt(self))
        } else {
            None
        }
    }

    /// Wait for the drain to complete, giving up after `timeout`
    ///
    /// Returns `true` if the gate reached `Closed`.
    pub fn await_drained_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut inner = self.inner.lock();
        while !Self::is_drained(&inner) {
            if self.drained.wait_until(&mut inner, deadline).timed_out() {
                return Self::is_drained(&inner);
            }
        }
        true
    }

    fn is_drained(inner: &GateInner) -> bool {
        inner.draining && inner.admitted == 0
    }
}

impl AdmissionGate for Gate {
    fn enter(&self) {
        let mut inner = self.inner.lock();
        while inner.draining {
            self.opened.wait(&mut inner);
        }
        inner.admitted += 1;
    }

    fn leave(&self) {
        let mut inner = self.inner.lock();
        if inner.admitted == 0 {
            tracing::error!("gate leave() without matching enter()");
            return;
        }
        inner.admitted -= 1;
        if Self::is_drained(&inner) {
            tracing::debug!("gate drained");
            self.drained.notify_all();
        }
    }

    fn request_drain(&self) {
        let mut inner = self.inner.lock();
        if inner.draining {
            return;
        }
        inner.draining = true;
        tracing::debug!(admitted = inner.admitted, "gate draining");
        if inner.admitted == 0 {
            self.drained.notify_all();
        }
    }

    fn await_drained(&self) {
        let mut inner = self.inner.lock();
        while !Self::is_drained(&inner) {
            self.drained.wait(&mut inner);
        }
    }

    fn reopen(&self) {
        let mut inner = self.inner.lock();
        if inner.draining {
            inner.draining = false;
            tracing::debug!("gate reopened");
            self.opened.notify_all();
        }
    }

    fn state(&self) -> GateState {
        let inner = self.inner.lock();
        match (inner.draining, inner.admitted) {
            (false, _) => GateState::Open,
            (true, 0) => GateState::Closed,
            (true, _) => GateState::Draining,
        }
    }

    fn admitted(&self) -> usize {
        self.inner.lock().admitted
    }
}
