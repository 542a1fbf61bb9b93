//! Dispatcher Tests
//!
//! Tests for request handling, fault mapping and gate bookkeeping.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rpcgate::protocol::{Body, ObjectId, ObjectKind, Request, Status, Value};
use rpcgate::{AdmissionGate, ConfigGraph, Dispatcher, Gate, GateState, Service};

fn setup() -> (Arc<Gate>, Dispatcher) {
    let gate = Arc::new(Gate::new());
    let mut graph = ConfigGraph::new();
    graph.add_host("web01", "10.0.0.1").unwrap();
    let dispatcher = Dispatcher::new(
        Arc::clone(&gate) as Arc<dyn AdmissionGate>,
        graph.into_shared(),
    );
    (gate, dispatcher)
}

#[test]
fn test_ping() {
    let (gate, dispatcher) = setup();
    let response = dispatcher.call(Request::Ping);
    assert!(response.is_ok());
    assert_eq!(response.body, Body::Empty);
    assert_eq!(gate.admitted(), 0);
}

#[test]
fn test_add_then_get() {
    let (gate, dispatcher) = setup();

    let response = dispatcher.call(Request::AddService {
        host: "web01".to_string(),
        description: "HTTP".to_string(),
    });
    assert!(response.is_ok());

    let response = dispatcher.call(Request::Get {
        target: ObjectId::service("web01", "HTTP"),
        field: "check_interval".to_string(),
    });
    assert_eq!(response.body, Body::Value(Value::Int(5)));
    assert_eq!(gate.admitted(), 0);
}

#[test]
fn test_set_updates_graph() {
    let (_gate, dispatcher) = setup();

    let response = dispatcher.call(Request::Set {
        target: ObjectId::host("web01"),
        field: "address".to_string(),
        value: Value::Text("10.0.0.9".to_string()),
    });
    assert!(response.is_ok());
    assert_eq!(
        dispatcher.graph().read().host("web01").unwrap().address,
        "10.0.0.9"
    );
}

#[test]
fn test_unknown_object_is_invalid_parameter() {
    let (gate, dispatcher) = setup();

    let response = dispatcher.call(Request::Get {
        target: ObjectId::host("x"),
        field: "address".to_string(),
    });

    assert_eq!(response.status, Status::InvalidParameter);
    match &response.body {
        Body::Fault { reason, detail } => {
            assert_eq!(reason, "Invalid parameter.");
            assert_eq!(detail, "Host `x' not found.");
        }
        other => panic!("Expected fault, got {:?}", other),
    }
    assert_eq!(gate.admitted(), 0);
}

#[test]
fn test_downtime_lifecycle() {
    let (_gate, dispatcher) = setup();

    let response = dispatcher.call(Request::ScheduleDowntime {
        host: "web01".to_string(),
        service: None,
        start: 1000,
        end: 2000,
        author: "admin".to_string(),
        comment: "reboot".to_string(),
    });
    let id = match response.body {
        Body::Id(id) => id,
        other => panic!("Expected id, got {:?}", other),
    };

    let response = dispatcher.call(Request::List {
        kind: ObjectKind::Downtime,
    });
    assert_eq!(response.body, Body::Names(vec![id.to_string()]));

    assert!(dispatcher.call(Request::DeleteDowntime { id }).is_ok());
    let again = dispatcher.call(Request::DeleteDowntime { id });
    assert_eq!(again.status, Status::InvalidParameter);
}

#[test]
fn test_process_signals() {
    let (_gate, dispatcher) = setup();
    let signals = dispatcher.signals();

    assert!(!signals.shutdown_requested());
    assert!(dispatcher.call(Request::ProcessShutdown).is_ok());
    assert!(signals.shutdown_requested());

    assert!(dispatcher.call(Request::ProcessRestart).is_ok());
    assert!(signals.take_restart());
    assert!(!signals.take_restart());
}

#[test]
fn test_call_waits_while_gate_drains() {
    let (gate, dispatcher) = setup();
    let dispatcher = Arc::new(dispatcher);

    gate.request_drain();
    assert_eq!(gate.state(), GateState::Closed);

    let caller = {
        let dispatcher = Arc::clone(&dispatcher);
        thread::spawn(move || dispatcher.call(Request::Ping))
    };

    thread::sleep(Duration::from_millis(50));
    assert!(!caller.is_finished());

    gate.reopen();
    assert!(caller.join().unwrap().is_ok());
    assert_eq!(gate.admitted(), 0);
}

#[test]
fn test_concurrent_calls_leave_gate_balanced() {
    let (gate, dispatcher) = setup();
    let dispatcher = Arc::new(dispatcher);

    let mut threads = Vec::new();
    for i in 0..8 {
        let dispatcher = Arc::clone(&dispatcher);
        threads.push(thread::spawn(move || {
            for j in 0..50 {
                dispatcher.call(Request::AddContact {
                    name: format!("c{}-{}", i, j),
                    email: "x@example.com".to_string(),
                });
                dispatcher.call(Request::Get {
                    target: ObjectId::host("missing"),
                    field: "address".to_string(),
                });
            }
        }));
    }
    for t in threads {
        t.join().unwrap();
    }

    assert_eq!(gate.admitted(), 0);
    assert_eq!(dispatcher.graph().read().len(ObjectKind::Contact), 400);

    gate.request_drain();
    assert!(gate.await_drained_timeout(Duration::from_millis(100)));
}
