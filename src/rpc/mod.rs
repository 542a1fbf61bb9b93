//! RPC Module
//!
//! Handler boundary between the network layer and the configuration graph.
//!
//! ## Handler contract
//! 1. Enter the admission gate (RAII [`Admission`])
//! 2. Run the domain operation
//! 3. Map the outcome: validation failures → `InvalidParameter`, anything
//!    else (including panics) → `RuntimeError`
//! 4. Leave the gate on every path, by dropping the guard

mod dispatcher;

use std::panic::{self, AssertUnwindSafe};

use crate::error::RpcError;
use crate::gate::{Admission, AdmissionGate};
use crate::protocol::{Request, Response};

pub use dispatcher::{Dispatcher, EngineSignals};

/// Something that answers RPC requests
///
/// Called concurrently from every worker thread.
pub trait Service: Send + Sync + 'static {
    fn call(&self, request: Request) -> Response;
}

/// Run `handler` inside `gate`, turning panics into runtime errors
///
/// The gate is left before this returns, whatever the handler did.
pub fn run_guarded<G, T, F>(gate: &G, name: &str, handler: F) -> Result<T, RpcError>
where
    G: AdmissionGate + ?Sized,
    F: FnOnce() -> Result<T, RpcError>,
{
    let _admission = Admission::acquire(gate);

    match panic::catch_unwind(AssertUnwindSafe(handler)) {
        Ok(outcome) => outcome,
        Err(_) => {
            tracing::debug!(handler = name, "handler failed. catch all.");
            Err(RpcError::runtime("catch all"))
        }
    }
}
