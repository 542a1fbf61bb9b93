//! Configuration objects
//!
//! Plain records held by the graph. Defaults match a freshly declared object.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Host {
    pub name: String,
    pub alias: String,
    pub address: String,
    /// Minutes between scheduled checks
    pub check_interval: i64,
    pub max_check_attempts: i64,
    pub active_checks_enabled: bool,
    pub passive_checks_enabled: bool,
    pub notifications_enabled: bool,
    pub event_handler_enabled: bool,
    pub flap_detection_enabled: bool,
    pub acknowledged: bool,
}

impl Default for Host {
    fn default() -> Self {
        Self {
            name: String::new(),
            alias: String::new(),
            address: String::new(),
            check_interval: 5,
            max_check_attempts: 3,
            active_checks_enabled: true,
            passive_checks_enabled: true,
            notifications_enabled: true,
            event_handler_enabled: true,
            flap_detection_enabled: true,
            acknowledged: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Service {
    pub host: String,
    pub description: String,
    pub check_interval: i64,
    pub max_check_attempts: i64,
    pub active_checks_enabled: bool,
    pub notifications_enabled: bool,
    pub acknowledged: bool,
    pub is_volatile: bool,
}

impl Default for Service {
    fn default() -> Self {
        Self {
            host: String::new(),
            description: String::new(),
            check_interval: 5,
            max_check_attempts: 3,
            active_checks_enabled: true,
            notifications_enabled: true,
            acknowledged: false,
            is_volatile: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub name: String,
    pub alias: String,
    pub email: String,
    pub pager: String,
    pub host_notifications_enabled: bool,
    pub service_notifications_enabled: bool,
    pub can_submit_commands: bool,
}

impl Default for Contact {
    fn default() -> Self {
        Self {
            name: String::new(),
            alias: String::new(),
            email: String::new(),
            pager: String::new(),
            host_notifications_enabled: true,
            service_notifications_enabled: true,
            can_submit_commands: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Downtime {
    pub id: u64,
    pub host: String,
    /// `None` for a host downtime
    pub service: Option<String>,
    /// Unix seconds
    pub start: i64,
    /// Unix seconds
    pub end: i64,
    pub author: String,
    pub comment: String,
    pub fixed: bool,
}

/// Parameters of a new downtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DowntimeSpec {
    pub host: String,
    pub service: Option<String>,
    pub start: i64,
    pub end: i64,
    pub author: String,
    pub comment: String,
}
