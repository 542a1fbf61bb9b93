//! Gate Module
//!
//! Admission/drain barrier in front of the shared configuration graph.
//!
//! ## Protocol
//! ```text
//!        request_drain()              last leave()
//!  Open ─────────────────► Draining ─────────────────► Closed
//!   ▲                                                    │
//!   └──────────────────────── reopen() ──────────────────┘
//! ```
//!
//! - `enter()` only succeeds while `Open`; otherwise it blocks until reopened
//! - Several callers may be admitted at once: the gate is a barrier, not a mutex
//! - Every successful `enter()` is paired with exactly one `leave()`, enforced
//!   by the [`Admission`] guard

mod barrier;
mod guard;

pub use barrier::Gate;
pub use guard::Admission;

/// Observable gate states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Accepting new callers
    Open,

    /// Drain requested, admitted callers still inside
    Draining,

    /// Drain requested and every admitted caller has left
    Closed,
}

/// Coordination object passed to the server loop and to every handler
///
/// Implementations must update their counter and state atomically with
/// respect to concurrent `enter`/`leave`/`request_drain` calls.
pub trait AdmissionGate: Send + Sync {
    /// Block until the gate is open, then register the caller
    fn enter(&self);

    /// Unregister a caller admitted by `enter`
    fn leave(&self);

    /// Stop admitting new callers
    fn request_drain(&self);

    /// Block until a drain was requested and no caller is admitted
    fn await_drained(&self);

    /// Admit callers again after a drain, waking the ones parked in `enter`
    fn reopen(&self);

    /// Current state
    fn state(&self) -> GateState;

    /// Number of callers currently admitted
    fn admitted(&self) -> usize;
}
