//! Graph Module
//!
//! In-memory configuration graph: hosts, services, contacts and downtimes.
//!
//! ## Ownership
//! - Services and downtimes reference their host by name
//! - The graph is not internally synchronized; RPC handlers share it as a
//!   [`SharedGraph`] and enter the admission gate before locking it

mod fields;
mod objects;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Deserialize;

use crate::error::{GateError, Result};
use crate::protocol::{ObjectId, ObjectKind, Value};

use fields::Fields;

pub use objects::{Contact, Downtime, DowntimeSpec, Host, Service};

/// Largest downtime id; ids are exposed as signed integer fields
pub const MAX_DOWNTIME_ID: u64 = i64::MAX as u64;

/// Graph handle shared by every RPC handler
pub type SharedGraph = Arc<RwLock<ConfigGraph>>;

/// The configuration objects served over RPC
#[derive(Debug, Clone)]
pub struct ConfigGraph {
    hosts: BTreeMap<String, Host>,

    /// Keyed by (host, description)
    services: BTreeMap<(String, String), Service>,

    contacts: BTreeMap<String, Contact>,

    downtimes: BTreeMap<u64, Downtime>,

    /// Next id handed out by `schedule_downtime`
    next_downtime_id: u64,
}

impl Default for ConfigGraph {
    fn default() -> Self {
        Self {
            hosts: BTreeMap::new(),
            services: BTreeMap::new(),
            contacts: BTreeMap::new(),
            downtimes: BTreeMap::new(),
            next_downtime_id: 1,
        }
    }
}

/// On-disk object file layout
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct GraphFile {
    hosts: Vec<Host>,
    services: Vec<Service>,
    contacts: Vec<Contact>,
    downtimes: Vec<Downtime>,
}

fn not_found(id: &ObjectId) -> GateError {
    GateError::InvalidParameter(format!("{} not found.", id))
}

impl ConfigGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the graph for sharing between handlers
    pub fn into_shared(self) -> SharedGraph {
        Arc::new(RwLock::new(self))
    }

    /// Load objects from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            GateError::Config(format!("cannot read `{}': {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    /// Build a graph from a JSON document, validating every reference
    pub fn from_json(raw: &str) -> Result<Self> {
        let file: GraphFile = serde_json::from_str(raw)?;
        let mut graph = Self::new();

        for host in file.hosts {
            graph.insert_host(host)?;
        }
        for service in file.services {
            graph.insert_service(service)?;
        }
        for contact in file.contacts {
            graph.insert_contact(contact)?;
        }
        for downtime in file.downtimes {
            graph.insert_downtime(downtime)?;
        }

        Ok(graph)
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Declare a new host
    pub fn add_host(&mut self, name: &str, address: &str) -> Result<()> {
        self.insert_host(Host {
            name: name.to_string(),
            alias: name.to_string(),
            address: address.to_string(),
            ..Host::default()
        })
    }

    /// Declare a new service on an existing host
    pub fn add_service(&mut self, host: &str, description: &str) -> Result<()> {
        self.insert_service(Service {
            host: host.to_string(),
            description: description.to_string(),
            ..Service::default()
        })
    }

    /// Declare a new contact
    pub fn add_contact(&mut self, name: &str, email: &str) -> Result<()> {
        self.insert_contact(Contact {
            name: name.to_string(),
            alias: name.to_string(),
            email: email.to_string(),
            ..Contact::default()
        })
    }

    /// Schedule a downtime and return its id
    pub fn schedule_downtime(&mut self, spec: DowntimeSpec) -> Result<u64> {
        let id = self.next_downtime_id;
        self.insert_downtime(Downtime {
            id,
            host: spec.host,
            service: spec.service,
            start: spec.start,
            end: spec.end,
            author: spec.author,
            comment: spec.comment,
            fixed: true,
        })?;
        Ok(id)
    }

    /// Remove a downtime
    pub fn delete_downtime(&mut self, id: u64) -> Result<Downtime> {
        self.downtimes
            .remove(&id)
            .ok_or_else(|| not_found(&ObjectId::downtime(id)))
    }

    fn insert_host(&mut self, host: Host) -> Result<()> {
        if host.name.is_empty() {
            return Err(GateError::InvalidParameter(
                "Host name must not be empty.".to_string(),
            ));
        }
        if self.hosts.contains_key(&host.name) {
            return Err(GateError::InvalidParameter(format!(
                "Host `{}' already exists.",
                host.name
            )));
        }
        self.hosts.insert(host.name.clone(), host);
        Ok(())
    }

    fn insert_service(&mut self, service: Service) -> Result<()> {
        if service.description.is_empty() {
            return Err(GateError::InvalidParameter(
                "Service description must not be empty.".to_string(),
            ));
        }
        if !self.hosts.contains_key(&service.host) {
            return Err(not_found(&ObjectId::host(service.host.as_str())));
        }
        let key = (service.host.clone(), service.description.clone());
        if self.services.contains_key(&key) {
            return Err(GateError::InvalidParameter(format!(
                "Service `{}' on host `{}' already exists.",
                service.description, service.host
            )));
        }
        self.services.insert(key, service);
        Ok(())
    }

    fn insert_contact(&mut self, contact: Contact) -> Result<()> {
        if contact.name.is_empty() {
            return Err(GateError::InvalidParameter(
                "Contact name must not be empty.".to_string(),
            ));
        }
        if self.contacts.contains_key(&contact.name) {
            return Err(GateError::InvalidParameter(format!(
                "Contact `{}' already exists.",
                contact.name
            )));
        }
        self.contacts.insert(contact.name.clone(), contact);
        Ok(())
    }

    fn insert_downtime(&mut self, downtime: Downtime) -> Result<()> {
        if downtime.id > MAX_DOWNTIME_ID {
            return Err(GateError::InvalidParameter(format!(
                "Downtime id `{}' is out of range.",
                downtime.id
            )));
        }
        if !self.hosts.contains_key(&downtime.host) {
            return Err(not_found(&ObjectId::host(downtime.host.as_str())));
        }
        if let Some(service) = &downtime.service {
            let key = (downtime.host.clone(), service.clone());
            if !self.services.contains_key(&key) {
                return Err(not_found(&ObjectId::service(
                    downtime.host.as_str(),
                    service.as_str(),
                )));
            }
        }
        fields::check_window(downtime.start, downtime.end)?;
        if self.downtimes.contains_key(&downtime.id) {
            return Err(GateError::InvalidParameter(format!(
                "Downtime `{}' already exists.",
                downtime.id
            )));
        }

        let next = downtime.id.checked_add(1).ok_or_else(|| {
            GateError::InvalidParameter(format!("Downtime id `{}' is out of range.", downtime.id))
        })?;
        self.next_downtime_id = self.next_downtime_id.max(next);
        self.downtimes.insert(downtime.id, downtime);
        Ok(())
    }

    // =========================================================================
    // Field Access
    // =========================================================================

    /// Read one field of an object
    pub fn get_field(&self, target: &ObjectId, field: &str) -> Result<Value> {
        match target {
            ObjectId::Host { name } => {
                fields::read(self.hosts.get(name).ok_or_else(|| not_found(target))?, field)
            }
            ObjectId::Service { host, description } => {
                let key = (host.clone(), description.clone());
                fields::read(self.services.get(&key).ok_or_else(|| not_found(target))?, field)
            }
            ObjectId::Contact { name } => {
                fields::read(self.contacts.get(name).ok_or_else(|| not_found(target))?, field)
            }
            ObjectId::Downtime { id } => {
                fields::read(self.downtimes.get(id).ok_or_else(|| not_found(target))?, field)
            }
        }
    }

    /// Replace one field of an object
    pub fn set_field(&mut self, target: &ObjectId, field: &str, value: Value) -> Result<()> {
        match target {
            ObjectId::Host { name } => self
                .hosts
                .get_mut(name)
                .ok_or_else(|| not_found(target))?
                .set(field, value),
            ObjectId::Service { host, description } => {
                let key = (host.clone(), description.clone());
                self.services
                    .get_mut(&key)
                    .ok_or_else(|| not_found(target))?
                    .set(field, value)
            }
            ObjectId::Contact { name } => self
                .contacts
                .get_mut(name)
                .ok_or_else(|| not_found(target))?
                .set(field, value),
            ObjectId::Downtime { id } => self
                .downtimes
                .get_mut(id)
                .ok_or_else(|| not_found(target))?
                .set(field, value),
        }
    }

    /// Field names accepted by `get_field` for a kind
    pub fn field_names(kind: ObjectKind) -> &'static [&'static str] {
        match kind {
            ObjectKind::Host => Host::FIELDS,
            ObjectKind::Service => Service::FIELDS,
            ObjectKind::Contact => Contact::FIELDS,
            ObjectKind::Downtime => Downtime::FIELDS,
        }
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Names of every object of a kind, sorted
    ///
    /// Services are listed as `host;description`, downtimes by id.
    pub fn names(&self, kind: ObjectKind) -> Vec<String> {
        match kind {
            ObjectKind::Host => self.hosts.keys().cloned().collect(),
            ObjectKind::Service => self
                .services
                .keys()
                .map(|(host, description)| format!("{};{}", host, description))
                .collect(),
            ObjectKind::Contact => self.contacts.keys().cloned().collect(),
            ObjectKind::Downtime => self.downtimes.keys().map(|id| id.to_string()).collect(),
        }
    }

    pub fn host(&self, name: &str) -> Option<&Host> {
        self.hosts.get(name)
    }

    pub fn service(&self, host: &str, description: &str) -> Option<&Service> {
        self.services
            .get(&(host.to_string(), description.to_string()))
    }

    pub fn contact(&self, name: &str) -> Option<&Contact> {
        self.contacts.get(name)
    }

    pub fn downtime(&self, id: u64) -> Option<&Downtime> {
        self.downtimes.get(&id)
    }

    /// Number of objects of a kind
    pub fn len(&self, kind: ObjectKind) -> usize {
        match kind {
            ObjectKind::Host => self.hosts.len(),
            ObjectKind::Service => self.services.len(),
            ObjectKind::Contact => self.contacts.len(),
            ObjectKind::Downtime => self.downtimes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
            && self.services.is_empty()
            && self.contacts.is_empty()
            && self.downtimes.is_empty()
    }
}
