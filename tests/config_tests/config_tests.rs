//! Configuration Tests

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use rpcgate::config::TlsAuthMode;
use rpcgate::{Config, GateError, TlsConfig};
use tempfile::NamedTempFile;

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.host, "");
    assert_eq!(config.port, 4242);
    assert_eq!(config.thread_count, 1);
    assert_eq!(config.accept_timeout(), Duration::from_millis(500));
    assert_eq!(config.read_timeout(), Some(Duration::from_secs(5)));
    assert_eq!(config.handshake_timeout(), Duration::from_secs(5));
    assert!(!config.tls.enable);
    assert_eq!(config.bind_addr(), "0.0.0.0:4242");
}

#[test]
fn test_builder() {
    let config = Config::builder()
        .host("127.0.0.1")
        .port(0)
        .thread_count(4)
        .accept_timeout_ms(50)
        .read_timeout_ms(0)
        .build();

    assert_eq!(config.bind_addr(), "127.0.0.1:0");
    assert_eq!(config.thread_count, 4);
    assert_eq!(config.read_timeout(), None);
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_rejects_zero_threads() {
    let config = Config::builder().thread_count(0).build();
    assert!(matches!(config.validate(), Err(GateError::Config(_))));

    let raw = r#"{ "thread_count": 0 }"#;
    assert!(Config::from_json(raw).is_err());
}

#[test]
fn test_from_json_units_and_ssl() {
    let raw = r#"{
        "host": "localhost",
        "port": 8080,
        "thread_count": 3,
        "accept_timeout": 250,
        "recv_timeout": 2,
        "send_timeout": 0,
        "ssl": { "enable": true, "keyfile": "/etc/rpcgate/server.pem", "cacert": "" }
    }"#;
    let config = Config::from_json(raw).unwrap();

    assert_eq!(config.bind_addr(), "localhost:8080");
    assert_eq!(config.thread_count, 3);
    assert_eq!(config.accept_timeout_ms, 250);
    assert_eq!(config.read_timeout_ms, 2000);
    assert_eq!(config.write_timeout(), None);
    assert!(config.tls.enable);
    assert_eq!(
        config.tls.keyfile,
        Some(PathBuf::from("/etc/rpcgate/server.pem"))
    );
    assert_eq!(config.tls.cacert, None);
}

#[test]
fn test_handshake_timeout() {
    let config = Config::from_json(r#"{ "handshake_timeout": 750 }"#).unwrap();
    assert_eq!(config.handshake_timeout(), Duration::from_millis(750));

    // Zero would leave the accept thread unbounded
    let config = Config::builder().handshake_timeout_ms(0).build();
    assert!(matches!(config.validate(), Err(GateError::Config(_))));
}

#[test]
fn test_from_json_rejects_unknown_key() {
    assert!(matches!(
        Config::from_json(r#"{ "prot": 80 }"#),
        Err(GateError::Config(_))
    ));
    assert!(Config::from_json(r#"{ "ssl": { "enabled": true } }"#).is_err());
}

#[test]
fn test_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{ "port": 9000 }}"#).unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.port, 9000);
    assert_eq!(config.thread_count, 1);

    assert!(Config::from_file("/nonexistent/rpcgate.json").is_err());
}

#[test]
fn test_tls_auth_mode() {
    let anonymous = TlsConfig {
        enable: true,
        ..TlsConfig::default()
    };
    assert_eq!(anonymous.auth_mode(), TlsAuthMode::NoAuthentication);

    let keyed = TlsConfig {
        enable: true,
        keyfile: Some(PathBuf::from("server.pem")),
        ..TlsConfig::default()
    };
    assert_eq!(keyed.auth_mode(), TlsAuthMode::Verify);

    let dh_only = TlsConfig {
        dh: Some(PathBuf::from("dh.pem")),
        ..TlsConfig::default()
    };
    assert_eq!(dh_only.auth_mode(), TlsAuthMode::Verify);
}
