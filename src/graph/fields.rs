//! Field accessor tables
//!
//! One `match` per object kind maps a field name to its value. Read-only
//! fields are the ones forming the object's identity.

use crate::error::{GateError, Result};
use crate::protocol::Value;

use super::objects::{Contact, Downtime, Host, Service};

/// Named-field access on a configuration object
pub(crate) trait Fields {
    /// Object kind used in error messages
    const KIND: &'static str;

    /// Every readable field, in declaration order
    const FIELDS: &'static [&'static str];

    fn get(&self, field: &str) -> Option<Value>;

    fn set(&mut self, field: &str, value: Value) -> Result<()>;
}

fn unknown_field(kind: &str, field: &str) -> GateError {
    GateError::InvalidParameter(format!("{} has no field `{}'.", kind, field))
}

fn read_only(kind: &str, field: &str) -> GateError {
    GateError::InvalidParameter(format!("{} field `{}' is read-only.", kind, field))
}

fn type_mismatch(field: &str, expected: &str, got: &Value) -> GateError {
    GateError::InvalidParameter(format!(
        "Field `{}' expects {}, got {}.",
        field,
        expected,
        got.type_name()
    ))
}

fn as_bool(field: &str, value: Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(type_mismatch(field, "bool", &other)),
    }
}

fn as_text(field: &str, value: Value) -> Result<String> {
    match value {
        Value::Text(s) => Ok(s),
        other => Err(type_mismatch(field, "text", &other)),
    }
}

fn as_int_at_least(field: &str, value: Value, min: i64) -> Result<i64> {
    match value {
        Value::Int(i) if i >= min => Ok(i),
        Value::Int(i) => Err(GateError::InvalidParameter(format!(
            "Field `{}' must be at least {}, got {}.",
            field, min, i
        ))),
        other => Err(type_mismatch(field, "int", &other)),
    }
}

impl Fields for Host {
    const KIND: &'static str = "Host";
    const FIELDS: &'static [&'static str] = &[
        "name",
        "alias",
        "address",
        "check_interval",
        "max_check_attempts",
        "active_checks_enabled",
        "passive_checks_enabled",
        "notifications_enabled",
        "event_handler_enabled",
        "flap_detection_enabled",
        "acknowledged",
    ];

    fn get(&self, field: &str) -> Option<Value> {
        let value = match field {
            "name" => Value::Text(self.name.clone()),
            "alias" => Value::Text(self.alias.clone()),
            "address" => Value::Text(self.address.clone()),
            "check_interval" => Value::Int(self.check_interval),
            "max_check_attempts" => Value::Int(self.max_check_attempts),
            "active_checks_enabled" => Value::Bool(self.active_checks_enabled),
            "passive_checks_enabled" => Value::Bool(self.passive_checks_enabled),
            "notifications_enabled" => Value::Bool(self.notifications_enabled),
            "event_handler_enabled" => Value::Bool(self.event_handler_enabled),
            "flap_detection_enabled" => Value::Bool(self.flap_detection_enabled),
            "acknowledged" => Value::Bool(self.acknowledged),
            _ => return None,
        };
        Some(value)
    }

    fn set(&mut self, field: &str, value: Value) -> Result<()> {
        match field {
            "name" => return Err(read_only(Self::KIND, field)),
            "alias" => self.alias = as_text(field, value)?,
            "address" => self.address = as_text(field, value)?,
            "check_interval" => self.check_interval = as_int_at_least(field, value, 0)?,
            "max_check_attempts" => self.max_check_attempts = as_int_at_least(field, value, 1)?,
            "active_checks_enabled" => self.active_checks_enabled = as_bool(field, value)?,
            "passive_checks_enabled" => self.passive_checks_enabled = as_bool(field, value)?,
            "notifications_enabled" => self.notifications_enabled = as_bool(field, value)?,
            "event_handler_enabled" => self.event_handler_enabled = as_bool(field, value)?,
            "flap_detection_enabled" => self.flap_detection_enabled = as_bool(field, value)?,
            "acknowledged" => self.acknowledged = as_bool(field, value)?,
            _ => return Err(unknown_field(Self::KIND, field)),
        }
        Ok(())
    }
}

impl Fields for Service {
    const KIND: &'static str = "Service";
    const FIELDS: &'static [&'static str] = &[
        "host",
        "description",
        "check_interval",
        "max_check_attempts",
        "active_checks_enabled",
        "notifications_enabled",
        "acknowledged",
        "is_volatile",
    ];

    fn get(&self, field: &str) -> Option<Value> {
        let value = match field {
            "host" => Value::Text(self.host.clone()),
            "description" => Value::Text(self.description.clone()),
            "check_interval" => Value::Int(self.check_interval),
            "max_check_attempts" => Value::Int(self.max_check_attempts),
            "active_checks_enabled" => Value::Bool(self.active_checks_enabled),
            "notifications_enabled" => Value::Bool(self.notifications_enabled),
            "acknowledged" => Value::Bool(self.acknowledged),
            "is_volatile" => Value::Bool(self.is_volatile),
            _ => return None,
        };
        Some(value)
    }

    fn set(&mut self, field: &str, value: Value) -> Result<()> {
        match field {
            "host" | "description" => return Err(read_only(Self::KIND, field)),
            "check_interval" => self.check_interval = as_int_at_least(field, value, 0)?,
            "max_check_attempts" => self.max_check_attempts = as_int_at_least(field, value, 1)?,
            "active_checks_enabled" => self.active_checks_enabled = as_bool(field, value)?,
            "notifications_enabled" => self.notifications_enabled = as_bool(field, value)?,
            "acknowledged" => self.acknowledged = as_bool(field, value)?,
            "is_volatile" => self.is_volatile = as_bool(field, value)?,
            _ => return Err(unknown_field(Self::KIND, field)),
        }
        Ok(())
    }
}

impl Fields for Contact {
    const KIND: &'static str = "Contact";
    const FIELDS: &'static [&'static str] = &[
        "name",
        "alias",
        "email",
        "pager",
        "host_notifications_enabled",
        "service_notifications_enabled",
        "can_submit_commands",
    ];

    fn get(&self, field: &str) -> Option<Value> {
        let value = match field {
            "name" => Value::Text(self.name.clone()),
            "alias" => Value::Text(self.alias.clone()),
            "email" => Value::Text(self.email.clone()),
            "pager" => Value::Text(self.pager.clone()),
            "host_notifications_enabled" => Value::Bool(self.host_notifications_enabled),
            "service_notifications_enabled" => Value::Bool(self.service_notifications_enabled),
            "can_submit_commands" => Value::Bool(self.can_submit_commands),
            _ => return None,
        };
        Some(value)
    }

    fn set(&mut self, field: &str, value: Value) -> Result<()> {
        match field {
            "name" => return Err(read_only(Self::KIND, field)),
            "alias" => self.alias = as_text(field, value)?,
            "email" => self.email = as_text(field, value)?,
            "pager" => self.pager = as_text(field, value)?,
            "host_notifications_enabled" => {
                self.host_notifications_enabled = as_bool(field, value)?
            }
            "service_notifications_enabled" => {
                self.service_notifications_enabled = as_bool(field, value)?
            }
            "can_submit_commands" => self.can_submit_commands = as_bool(field, value)?,
            _ => return Err(unknown_field(Self::KIND, field)),
        }
        Ok(())
    }
}

impl Fields for Downtime {
    const KIND: &'static str = "Downtime";
    const FIELDS: &'static [&'static str] = &[
        "id", "host", "service", "start", "end", "author", "comment", "fixed",
    ];

    fn get(&self, field: &str) -> Option<Value> {
        let value = match field {
            "id" => Value::Int(i64::try_from(self.id).unwrap_or(i64::MAX)),
            "host" => Value::Text(self.host.clone()),
            "service" => Value::Text(self.service.clone().unwrap_or_default()),
            "start" => Value::Int(self.start),
            "end" => Value::Int(self.end),
            "author" => Value::Text(self.author.clone()),
            "comment" => Value::Text(self.comment.clone()),
            "fixed" => Value::Bool(self.fixed),
            _ => return None,
        };
        Some(value)
    }

    fn set(&mut self, field: &str, value: Value) -> Result<()> {
        match field {
            "id" | "host" | "service" => return Err(read_only(Self::KIND, field)),
            "start" => {
                let start = as_int_at_least(field, value, 0)?;
                check_window(start, self.end)?;
                self.start = start;
            }
            "end" => {
                let end = as_int_at_least(field, value, 0)?;
                check_window(self.start, end)?;
                self.end = end;
            }
            "author" => self.author = as_text(field, value)?,
            "comment" => self.comment = as_text(field, value)?,
            "fixed" => self.fixed = as_bool(field, value)?,
            _ => return Err(unknown_field(Self::KIND, field)),
        }
        Ok(())
    }
}

/// A downtime must end strictly after it starts
pub(crate) fn check_window(start: i64, end: i64) -> Result<()> {
    if end <= start {
        return Err(GateError::InvalidParameter(format!(
            "Downtime end ({}) must be after start ({}).",
            end, start
        )));
    }
    Ok(())
}

/// Read a field or report it as unknown
pub(crate) fn read<T: Fields>(object: &T, field: &str) -> Result<Value> {
    object.get(field).ok_or_else(|| unknown_field(T::KIND, field))
}
