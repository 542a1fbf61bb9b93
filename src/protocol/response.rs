//! Response definitions
//!
//! Represents responses to clients.

use serde::{Deserialize, Serialize};

use crate::error::RpcError;

use super::Value;

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    InvalidParameter = 0x01,
    RuntimeError = 0x02,
}

impl Status {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Status::Ok),
            0x01 => Some(Status::InvalidParameter),
            0x02 => Some(Status::RuntimeError),
            _ => None,
        }
    }
}

/// What a successful call returns, or the fault text of a failed one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Body {
    Empty,
    Value(Value),
    Names(Vec<String>),
    Id(u64),
    Fault { reason: String, detail: String },
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Decoded payload
    pub body: Body,
}

impl Response {
    /// Create an OK response with no payload
    pub fn ok() -> Self {
        Self::with_body(Body::Empty)
    }

    /// Create an OK response carrying a field value
    pub fn value(value: Value) -> Self {
        Self::with_body(Body::Value(value))
    }

    /// Create an OK response carrying object names
    pub fn names(names: Vec<String>) -> Self {
        Self::with_body(Body::Names(names))
    }

    /// Create an OK response carrying a new object id
    pub fn id(id: u64) -> Self {
        Self::with_body(Body::Id(id))
    }

    fn with_body(body: Body) -> Self {
        Self {
            status: Status::Ok,
            body,
        }
    }

    /// Create an INVALID_PARAMETER fault
    pub fn invalid_parameter(detail: &str) -> Self {
        Self {
            status: Status::InvalidParameter,
            body: Body::Fault {
                reason: "Invalid parameter.".to_string(),
                detail: detail.to_string(),
            },
        }
    }

    /// Create a RUNTIME_ERROR fault
    pub fn runtime_error(detail: &str) -> Self {
        Self {
            status: Status::RuntimeError,
            body: Body::Fault {
                reason: "Runtime error.".to_string(),
                detail: detail.to_string(),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Fault detail, if this is a fault
    pub fn detail(&self) -> Option<&str> {
        match &self.body {
            Body::Fault { detail, .. } => Some(detail),
            _ => None,
        }
    }
}

impl From<RpcError> for Response {
    fn from(e: RpcError) -> Self {
        match e {
            RpcError::InvalidParameter(detail) => Response::invalid_parameter(&detail),
            RpcError::Runtime(detail) => Response::runtime_error(&detail),
        }
    }
}
