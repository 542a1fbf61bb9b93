//! Request definitions
//!
//! Represents RPC calls from clients.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Request types (first header byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RequestKind {
    Ping = 0x01,
    Get = 0x02,
    Set = 0x03,
    AddHost = 0x04,
    AddService = 0x05,
    AddContact = 0x06,
    ScheduleDowntime = 0x07,
    DeleteDowntime = 0x08,
    List = 0x09,
    ProcessShutdown = 0x0A,
    ProcessRestart = 0x0B,
}

impl RequestKind {
    pub fn from_u8(value: u8) -> Option<Self> {
        let kind = match value {
            0x01 => RequestKind::Ping,
            0x02 => RequestKind::Get,
            0x03 => RequestKind::Set,
            0x04 => RequestKind::AddHost,
            0x05 => RequestKind::AddService,
            0x06 => RequestKind::AddContact,
            0x07 => RequestKind::ScheduleDowntime,
            0x08 => RequestKind::DeleteDowntime,
            0x09 => RequestKind::List,
            0x0A => RequestKind::ProcessShutdown,
            0x0B => RequestKind::ProcessRestart,
            _ => return None,
        };
        Some(kind)
    }
}

/// Kinds of objects in the configuration graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Host,
    Service,
    Contact,
    Downtime,
}

/// Identifier of one configuration object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectId {
    Host { name: String },
    Service { host: String, description: String },
    Contact { name: String },
    Downtime { id: u64 },
}

impl ObjectId {
    pub fn host(name: impl Into<String>) -> Self {
        ObjectId::Host { name: name.into() }
    }

    pub fn service(host: impl Into<String>, description: impl Into<String>) -> Self {
        ObjectId::Service {
            host: host.into(),
            description: description.into(),
        }
    }

    pub fn contact(name: impl Into<String>) -> Self {
        ObjectId::Contact { name: name.into() }
    }

    pub fn downtime(id: u64) -> Self {
        ObjectId::Downtime { id }
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            ObjectId::Host { .. } => ObjectKind::Host,
            ObjectId::Service { .. } => ObjectKind::Service,
            ObjectId::Contact { .. } => ObjectKind::Contact,
            ObjectId::Downtime { .. } => ObjectKind::Downtime,
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectId::Host { name } => write!(f, "Host `{}'", name),
            ObjectId::Service { host, description } => {
                write!(f, "Service `{}' on host `{}'", description, host)
            }
            ObjectId::Contact { name } => write!(f, "Contact `{}'", name),
            ObjectId::Downtime { id } => write!(f, "Downtime `{}'", id),
        }
    }
}

/// A field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Text(_) => "text",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A parsed RPC call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    /// Health check
    Ping,

    /// Read one field
    Get { target: ObjectId, field: String },

    /// Replace one field
    Set {
        target: ObjectId,
        field: String,
        value: Value,
    },

    /// Create a host
    AddHost { name: String, address: String },

    /// Create a service attached to an existing host
    AddService { host: String, description: String },

    /// Create a contact
    AddContact { name: String, email: String },

    /// Schedule a downtime on a host, or on one of its services
    ScheduleDowntime {
        host: String,
        service: Option<String>,
        /// Unix seconds
        start: i64,
        /// Unix seconds
        end: i64,
        author: String,
        comment: String,
    },

    /// Remove a downtime
    DeleteDowntime { id: u64 },

    /// Names of every object of a kind
    List { kind: ObjectKind },

    /// Ask the engine to shut down
    ProcessShutdown,

    /// Ask the engine to restart
    ProcessRestart,
}

impl Request {
    /// Get the request type
    pub fn kind(&self) -> RequestKind {
        match self {
            Request::Ping => RequestKind::Ping,
            Request::Get { .. } => RequestKind::Get,
            Request::Set { .. } => RequestKind::Set,
            Request::AddHost { .. } => RequestKind::AddHost,
            Request::AddService { .. } => RequestKind::AddService,
            Request::AddContact { .. } => RequestKind::AddContact,
            Request::ScheduleDowntime { .. } => RequestKind::ScheduleDowntime,
            Request::DeleteDowntime { .. } => RequestKind::DeleteDowntime,
            Request::List { .. } => RequestKind::List,
            Request::ProcessShutdown => RequestKind::ProcessShutdown,
            Request::ProcessRestart => RequestKind::ProcessRestart,
        }
    }

    /// Handler name used in logs
    pub fn name(&self) -> &'static str {
        match self.kind() {
            RequestKind::Ping => "ping",
            RequestKind::Get => "get",
            RequestKind::Set => "set",
            RequestKind::AddHost => "add_host",
            RequestKind::AddService => "add_service",
            RequestKind::AddContact => "add_contact",
            RequestKind::ScheduleDowntime => "schedule_downtime",
            RequestKind::DeleteDowntime => "delete_downtime",
            RequestKind::List => "list",
            RequestKind::ProcessShutdown => "process_shutdown",
            RequestKind::ProcessRestart => "process_restart",
        }
    }
}
