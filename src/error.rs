//! Error types for rpcgate
//!
//! Provides a unified error type for all operations, plus the narrower
//! fault type every RPC handler reports to its caller.

use thiserror::Error;

/// Result type alias using GateError
pub type Result<T> = std::result::Result<T, GateError>;

/// Unified error type for rpcgate operations
#[derive(Debug, Error)]
pub enum GateError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Startup Errors
    // -------------------------------------------------------------------------
    #[error("bind with `{addr}' failed: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // RPC Errors
    // -------------------------------------------------------------------------
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    // -------------------------------------------------------------------------
    // Concurrency Errors
    // -------------------------------------------------------------------------
    #[error("Worker pool is closed")]
    PoolClosed,
}

impl From<bincode::Error> for GateError {
    fn from(e: bincode::Error) -> Self {
        GateError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for GateError {
    fn from(e: serde_json::Error) -> Self {
        GateError::Config(e.to_string())
    }
}

impl From<rustls::Error> for GateError {
    fn from(e: rustls::Error) -> Self {
        GateError::Tls(e.to_string())
    }
}

/// Outcome of a failed RPC call
///
/// Domain validation failures (unknown object, bad field, wrong type) are
/// `InvalidParameter`; everything else collapses into `Runtime`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    #[error("Invalid parameter. {0}")]
    InvalidParameter(String),

    #[error("Runtime error. {0}")]
    Runtime(String),
}

impl RpcError {
    pub fn invalid(message: impl Into<String>) -> Self {
        RpcError::InvalidParameter(message.into())
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        RpcError::Runtime(message.into())
    }
}

impl From<GateError> for RpcError {
    fn from(e: GateError) -> Self {
        match e {
            GateError::InvalidParameter(msg) => RpcError::InvalidParameter(msg),
            other => RpcError::Runtime(other.to_string()),
        }
    }
}
