//! TLS Tests
//!
//! Tests for TLS context setup and per-connection handshakes.

use std::fs;
use std::io::Write;
use std::net::TcpStream;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rpcgate::network::{generate_self_signed_cert, load_certs, load_private_key};
use rpcgate::protocol::Request;
use rpcgate::{
    AdmissionGate, Client, Config, ConfigGraph, Dispatcher, Gate, GateError, Server,
    ServerHandle, TlsConfig,
};
use tempfile::TempDir;

/// Self-signed `localhost` certificate written as a key bundle and a CA file
struct TestCert {
    _dir: TempDir,
    keyfile: PathBuf,
    cacert: PathBuf,
}

fn write_test_cert() -> TestCert {
    let dir = TempDir::new().unwrap();
    let generated = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let cert_pem = generated.cert.pem();
    let key_pem = generated.signing_key.serialize_pem();

    let keyfile = dir.path().join("server.pem");
    fs::write(&keyfile, format!("{}{}", cert_pem, key_pem)).unwrap();
    let cacert = dir.path().join("ca.pem");
    fs::write(&cacert, cert_pem).unwrap();

    TestCert {
        _dir: dir,
        keyfile,
        cacert,
    }
}

fn tls_config(tls: TlsConfig) -> Config {
    Config::builder()
        .host("127.0.0.1")
        .port(0)
        .thread_count(2)
        .accept_timeout_ms(20)
        .read_timeout_ms(1000)
        .write_timeout_ms(1000)
        .tls(tls)
        .build()
}

fn bind(config: Config) -> rpcgate::Result<Server> {
    let gate = Arc::new(Gate::new());
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&gate) as Arc<dyn AdmissionGate>,
        ConfigGraph::new().into_shared(),
    ));
    Server::bind(config, gate as Arc<dyn AdmissionGate>, dispatcher)
}

fn start(config: Config) -> ServerHandle {
    bind(config).unwrap().spawn().unwrap()
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

// =============================================================================
// Key Material
// =============================================================================

#[test]
fn test_load_key_bundle() {
    let cert = write_test_cert();
    assert_eq!(load_certs(&cert.keyfile).unwrap().len(), 1);
    assert!(load_private_key(&cert.keyfile).is_ok());
    assert!(load_private_key(&cert.cacert).is_err());
}

#[test]
fn test_generate_self_signed_cert() {
    let (certs, _key) = generate_self_signed_cert(vec!["localhost".to_string()]).unwrap();
    assert_eq!(certs.len(), 1);
}

// =============================================================================
// Handshakes
// =============================================================================

#[test]
fn test_tls_round_trip() {
    let cert = write_test_cert();
    let handle = start(tls_config(TlsConfig {
        enable: true,
        keyfile: Some(cert.keyfile.clone()),
        ..TlsConfig::default()
    }));

    {
        let mut client = Client::connect_tls(handle.local_addr(), "localhost", &cert.cacert).unwrap();
        assert!(client.call(&Request::Ping).unwrap().is_ok());
        let response = client
            .call(&Request::AddHost {
                name: "web01".to_string(),
                address: "10.0.0.1".to_string(),
            })
            .unwrap();
        assert!(response.is_ok());
    }

    // One connection, and one handshake, per call
    assert!(wait_until(Duration::from_secs(2), || handle.stats().served == 2));
    let stats = handle.stats();
    assert_eq!(stats.handshakes, 2);
    assert_eq!(stats.handshake_failures, 0);
    handle.stop().unwrap();
}

#[test]
fn test_failed_handshake_does_not_stop_server() {
    let cert = write_test_cert();
    let handle = start(tls_config(TlsConfig {
        enable: true,
        keyfile: Some(cert.keyfile.clone()),
        ..TlsConfig::default()
    }));

    {
        let mut garbage = TcpStream::connect(handle.local_addr()).unwrap();
        garbage.write_all(b"GET / HTTP/1.0\r\n\r\n").unwrap();
    }
    assert!(wait_until(Duration::from_secs(2), || {
        handle.stats().handshake_failures == 1
    }));
    assert_eq!(handle.stats().dispatched, 0);

    let mut client = Client::connect_tls(handle.local_addr(), "localhost", &cert.cacert).unwrap();
    assert!(client.call(&Request::Ping).unwrap().is_ok());
    drop(client);

    assert!(wait_until(Duration::from_secs(2), || handle.stats().dispatched == 1));
    assert_eq!(handle.stats().handshakes, 2);
    handle.stop().unwrap();
}

#[test]
fn test_silent_client_cannot_stall_handshakes() {
    let cert = write_test_cert();
    let config = Config::builder()
        .host("127.0.0.1")
        .port(0)
        .thread_count(1)
        .accept_timeout_ms(20)
        .read_timeout_ms(0)
        .write_timeout_ms(0)
        .handshake_timeout_ms(200)
        .tls(TlsConfig {
            enable: true,
            keyfile: Some(cert.keyfile.clone()),
            ..TlsConfig::default()
        })
        .build();
    let handle = start(config);

    // Connects and never starts the handshake
    let _silent = TcpStream::connect(handle.local_addr()).unwrap();
    assert!(wait_until(Duration::from_secs(2), || {
        handle.stats().handshake_failures == 1
    }));

    let mut client = Client::connect_tls(handle.local_addr(), "localhost", &cert.cacert).unwrap();
    client.set_timeout(Some(Duration::from_secs(2)));
    assert!(client.call(&Request::Ping).unwrap().is_ok());

    let started = Instant::now();
    handle.stop().unwrap();
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn test_plain_client_rejected_by_tls_server() {
    // No key material: generated certificate, no client authentication
    let handle = start(tls_config(TlsConfig {
        enable: true,
        ..TlsConfig::default()
    }));

    let mut client = Client::connect(handle.local_addr()).unwrap();
    client.set_timeout(Some(Duration::from_secs(2)));
    assert!(client.call(&Request::Ping).is_err());

    assert!(wait_until(Duration::from_secs(2), || {
        handle.stats().handshake_failures == 1
    }));
    handle.stop().unwrap();
}

#[test]
fn test_client_certificate_required_with_cacert() {
    let cert = write_test_cert();
    let handle = start(tls_config(TlsConfig {
        enable: true,
        keyfile: Some(cert.keyfile.clone()),
        cacert: Some(cert.cacert.clone()),
        ..TlsConfig::default()
    }));

    let mut client = Client::connect_tls(handle.local_addr(), "localhost", &cert.cacert).unwrap();
    client.set_timeout(Some(Duration::from_secs(2)));
    assert!(client.call(&Request::Ping).is_err());

    assert!(wait_until(Duration::from_secs(2), || {
        handle.stats().handshake_failures == 1
    }));
    assert_eq!(handle.stats().dispatched, 0);
    handle.stop().unwrap();
}

// =============================================================================
// Startup Failures
// =============================================================================

#[test]
fn test_password_is_a_startup_error() {
    let cert = write_test_cert();
    let result = bind(tls_config(TlsConfig {
        enable: true,
        keyfile: Some(cert.keyfile.clone()),
        password: Some("secret".to_string()),
        ..TlsConfig::default()
    }));

    match result {
        Err(GateError::Tls(msg)) => assert!(msg.contains("create ssl context")),
        Err(other) => panic!("Expected TLS error, got {:?}", other),
        Ok(_) => panic!("Expected TLS error"),
    }
}

#[test]
fn test_missing_keyfile_is_a_startup_error() {
    let result = bind(tls_config(TlsConfig {
        enable: true,
        keyfile: Some(PathBuf::from("/nonexistent/server.pem")),
        ..TlsConfig::default()
    }));
    assert!(matches!(result, Err(GateError::Tls(_))));
}

#[test]
fn test_dh_parameters_are_ignored() {
    let cert = write_test_cert();
    let server = bind(tls_config(TlsConfig {
        enable: true,
        keyfile: Some(cert.keyfile.clone()),
        dh: Some(PathBuf::from("/nonexistent/dh.pem")),
        ..TlsConfig::default()
    }));
    assert!(server.is_ok());
}
