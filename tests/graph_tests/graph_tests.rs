//! Configuration Graph Tests

use std::io::Write;

use rpcgate::graph::DowntimeSpec;
use rpcgate::protocol::{ObjectId, ObjectKind, Value};
use rpcgate::{ConfigGraph, GateError};
use tempfile::NamedTempFile;

fn graph_with_web01() -> ConfigGraph {
    let mut graph = ConfigGraph::new();
    graph.add_host("web01", "10.0.0.1").unwrap();
    graph.add_service("web01", "HTTP").unwrap();
    graph
}

fn downtime(host: &str, service: Option<&str>, start: i64, end: i64) -> DowntimeSpec {
    DowntimeSpec {
        host: host.to_string(),
        service: service.map(str::to_string),
        start,
        end,
        author: "admin".to_string(),
        comment: "maintenance".to_string(),
    }
}

fn invalid_message(result: rpcgate::Result<impl std::fmt::Debug>) -> String {
    match result {
        Err(GateError::InvalidParameter(msg)) => msg,
        other => panic!("Expected invalid parameter, got {:?}", other),
    }
}

// =============================================================================
// Creation
// =============================================================================

#[test]
fn test_add_host_defaults() {
    let graph = graph_with_web01();
    let host = graph.host("web01").unwrap();

    assert_eq!(host.address, "10.0.0.1");
    assert_eq!(host.alias, "web01");
    assert_eq!(host.check_interval, 5);
    assert!(host.active_checks_enabled);
    assert!(!host.acknowledged);
}

#[test]
fn test_duplicate_host_rejected() {
    let mut graph = graph_with_web01();
    let msg = invalid_message(graph.add_host("web01", "10.0.0.2"));
    assert_eq!(msg, "Host `web01' already exists.");
    assert_eq!(graph.host("web01").unwrap().address, "10.0.0.1");
}

#[test]
fn test_empty_names_rejected() {
    let mut graph = ConfigGraph::new();
    assert!(graph.add_host("", "10.0.0.1").is_err());
    assert!(graph.add_contact("", "a@b").is_err());
    assert!(graph.is_empty());
}

#[test]
fn test_service_requires_existing_host() {
    let mut graph = ConfigGraph::new();
    let msg = invalid_message(graph.add_service("ghost", "HTTP"));
    assert_eq!(msg, "Host `ghost' not found.");
}

#[test]
fn test_names_sorted_per_kind() {
    let mut graph = graph_with_web01();
    graph.add_host("db01", "10.0.0.2").unwrap();
    graph.add_service("web01", "DNS").unwrap();
    graph.add_contact("oncall", "oncall@example.com").unwrap();

    assert_eq!(graph.names(ObjectKind::Host), vec!["db01", "web01"]);
    assert_eq!(
        graph.names(ObjectKind::Service),
        vec!["web01;DNS", "web01;HTTP"]
    );
    assert_eq!(graph.names(ObjectKind::Contact), vec!["oncall"]);
    assert!(graph.names(ObjectKind::Downtime).is_empty());
    assert_eq!(graph.len(ObjectKind::Host), 2);
}

// =============================================================================
// Downtimes
// =============================================================================

#[test]
fn test_schedule_and_delete_downtime() {
    let mut graph = graph_with_web01();

    let first = graph.schedule_downtime(downtime("web01", None, 100, 200)).unwrap();
    let second = graph
        .schedule_downtime(downtime("web01", Some("HTTP"), 100, 200))
        .unwrap();
    assert_eq!(first, 1);
    assert_eq!(second, 2);
    assert!(graph.downtime(first).unwrap().fixed);

    let removed = graph.delete_downtime(first).unwrap();
    assert_eq!(removed.service, None);
    assert!(graph.downtime(first).is_none());

    let msg = invalid_message(graph.delete_downtime(first));
    assert_eq!(msg, "Downtime `1' not found.");

    // Ids are never reused
    let third = graph.schedule_downtime(downtime("web01", None, 300, 400)).unwrap();
    assert_eq!(third, 3);
}

#[test]
fn test_downtime_window_validated() {
    let mut graph = graph_with_web01();
    assert!(graph.schedule_downtime(downtime("web01", None, 200, 200)).is_err());
    assert!(graph.schedule_downtime(downtime("web01", None, 200, 100)).is_err());
    assert_eq!(graph.len(ObjectKind::Downtime), 0);
}

#[test]
fn test_downtime_on_unknown_service() {
    let mut graph = graph_with_web01();
    let msg = invalid_message(graph.schedule_downtime(downtime("web01", Some("SSH"), 1, 2)));
    assert_eq!(msg, "Service `SSH' on host `web01' not found.");
}

// =============================================================================
// Field Access
// =============================================================================

#[test]
fn test_get_and_set_field() {
    let mut graph = graph_with_web01();
    let target = ObjectId::service("web01", "HTTP");

    graph
        .set_field(&target, "max_check_attempts", Value::Int(5))
        .unwrap();
    assert_eq!(
        graph.get_field(&target, "max_check_attempts").unwrap(),
        Value::Int(5)
    );

    graph
        .set_field(&ObjectId::host("web01"), "notifications_enabled", Value::Bool(false))
        .unwrap();
    assert_eq!(
        graph
            .get_field(&ObjectId::host("web01"), "notifications_enabled")
            .unwrap(),
        Value::Bool(false)
    );
}

#[test]
fn test_set_field_errors() {
    let mut graph = graph_with_web01();
    let host = ObjectId::host("web01");

    let msg = invalid_message(graph.set_field(&host, "name", Value::Text("x".into())));
    assert!(msg.contains("read-only"));

    let msg = invalid_message(graph.set_field(&host, "check_interval", Value::Text("x".into())));
    assert!(msg.contains("expects int"));

    let msg = invalid_message(graph.set_field(&host, "max_check_attempts", Value::Int(0)));
    assert!(msg.contains("at least 1"));

    let msg = invalid_message(graph.get_field(&host, "colour"));
    assert_eq!(msg, "Host has no field `colour'.");

    let msg = invalid_message(graph.get_field(&ObjectId::contact("nobody"), "email"));
    assert_eq!(msg, "Contact `nobody' not found.");
}

#[test]
fn test_downtime_end_cannot_precede_start() {
    let mut graph = graph_with_web01();
    let id = graph.schedule_downtime(downtime("web01", None, 100, 200)).unwrap();
    let target = ObjectId::downtime(id);

    assert!(graph.set_field(&target, "end", Value::Int(50)).is_err());
    graph.set_field(&target, "end", Value::Int(500)).unwrap();
    assert_eq!(graph.get_field(&target, "end").unwrap(), Value::Int(500));
}

#[test]
fn test_field_names_are_readable() {
    let graph = graph_with_web01();
    for field in ConfigGraph::field_names(ObjectKind::Host) {
        assert!(graph.get_field(&ObjectId::host("web01"), field).is_ok());
    }
}

// =============================================================================
// Loading
// =============================================================================

#[test]
fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "hosts": [{{ "name": "web01", "address": "10.0.0.1", "check_interval": 2 }}],
            "services": [{{ "host": "web01", "description": "HTTP" }}],
            "contacts": [{{ "name": "oncall", "email": "oncall@example.com" }}],
            "downtimes": [{{ "id": 7, "host": "web01", "start": 10, "end": 20 }}]
        }}"#
    )
    .unwrap();

    let mut graph = ConfigGraph::load(file.path()).unwrap();
    assert_eq!(graph.host("web01").unwrap().check_interval, 2);
    assert_eq!(graph.service("web01", "HTTP").unwrap().max_check_attempts, 3);
    assert!(graph.contact("oncall").is_some());

    // New ids continue after the highest loaded one
    let id = graph.schedule_downtime(downtime("web01", None, 1, 2)).unwrap();
    assert_eq!(id, 8);
}

#[test]
fn test_load_rejects_dangling_reference() {
    let raw = r#"{ "services": [{ "host": "ghost", "description": "HTTP" }] }"#;
    assert!(matches!(
        ConfigGraph::from_json(raw),
        Err(GateError::InvalidParameter(_))
    ));
}

#[test]
fn test_load_rejects_unknown_section() {
    assert!(matches!(
        ConfigGraph::from_json(r#"{ "timeperiods": [] }"#),
        Err(GateError::Config(_))
    ));
}

fn graph_with_downtime_id(id: u64) -> rpcgate::Result<ConfigGraph> {
    ConfigGraph::from_json(&format!(
        r#"{{
            "hosts": [{{ "name": "web01", "address": "10.0.0.1" }}],
            "downtimes": [{{ "id": {}, "host": "web01", "start": 10, "end": 20 }}]
        }}"#,
        id
    ))
}

#[test]
fn test_load_rejects_out_of_range_downtime_id() {
    let msg = invalid_message(graph_with_downtime_id(u64::MAX));
    assert_eq!(msg, format!("Downtime id `{}' is out of range.", u64::MAX));

    let msg = invalid_message(graph_with_downtime_id(i64::MAX as u64 + 1));
    assert!(msg.contains("out of range"));
}

#[test]
fn test_largest_downtime_id_stays_positive() {
    let mut graph = graph_with_downtime_id(i64::MAX as u64).unwrap();

    let value = graph
        .get_field(&ObjectId::downtime(i64::MAX as u64), "id")
        .unwrap();
    assert_eq!(value, Value::Int(i64::MAX));

    // No id left to hand out
    let msg = invalid_message(graph.schedule_downtime(downtime("web01", None, 1, 2)));
    assert!(msg.contains("out of range"));
    assert_eq!(graph.len(ObjectKind::Downtime), 1);
}
