//! # rpcgate
//!
//! Remote-procedure-call front end for a monitoring engine's in-memory
//! configuration graph, with:
//! - An admission gate that drains in-flight handlers before shutdown or reconfiguration
//! - A bounded worker pool serving one connection per task
//! - Optional TLS on the listening endpoint
//! - A framed binary protocol with typed requests and faults
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Accept Loop (1 thread)                      │
//! │        accept → socket options → TLS handshake               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ ConnectionTask (moved)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │               Worker Pool (thread_count)                     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ Request
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │          Dispatcher: enter gate → handler → leave            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!                       ▼
//!               ┌───────────────┐
//!               │ ConfigGraph   │
//!               │   (RwLock)    │
//!               └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod client;
pub mod gate;
pub mod graph;
pub mod network;
pub mod pool;
pub mod protocol;
pub mod rpc;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use client::Client;
pub use config::{Config, TlsConfig};
pub use error::{GateError, Result, RpcError};
pub use gate::{Admission, AdmissionGate, Gate, GateState};
pub use graph::{ConfigGraph, SharedGraph};
pub use network::{Server, ServerHandle, ServerState};
pub use pool::WorkerPool;
pub use rpc::{Dispatcher, Service};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of rpcgate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
