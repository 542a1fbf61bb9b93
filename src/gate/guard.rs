//! Scoped admission
//!
//! Leaves the gate when dropped, including during unwinding.

use super::AdmissionGate;

/// RAII guard for one admitted caller
#[must_use = "dropping the admission leaves the gate immediately"]
pub struct Admission<'a, G: AdmissionGate + ?Sized> {
    gate: &'a G,
}

impl<'a, G: AdmissionGate + ?Sized> Admission<'a, G> {
    /// Enter `gate` (blocking while it is not open)
    pub fn acquire(gate: &'a G) -> Self {
        gate.enter();
        Self { gate }
    }

    /// Wrap a caller that already entered `gate`
    pub(crate) fn adopt(gate: &'a G) -> Self {
        Self { gate }
    }
}

impl<G: AdmissionGate + ?Sized> Drop for Admission<'_, G> {
    fn drop(&mut self) {
        self.gate.leave();
    }
}
