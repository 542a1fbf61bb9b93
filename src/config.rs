//! Configuration for rpcgate
//!
//! Centralized configuration with sensible defaults. Can be built in code
//! through [`ConfigBuilder`] or loaded from a JSON file mirroring the
//! webservice configuration tree.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{GateError, Result};

/// Main configuration for an rpcgate server
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Bind host; empty means all interfaces
    pub host: String,

    /// Bind port (0 picks an ephemeral port)
    pub port: u16,

    /// Listen backlog requested by the configuration file
    ///
    /// The std listener always uses the OS default; kept for logging.
    pub backlog: u32,

    /// How long one accept attempt waits before the loop re-checks the
    /// termination flag (milliseconds)
    pub accept_timeout_ms: u64,

    /// Connection receive timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection send timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,

    /// Deadline for a whole TLS handshake on the accept thread (milliseconds)
    pub handshake_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Pool Configuration
    // -------------------------------------------------------------------------
    /// Maximum number of connections served concurrently
    pub thread_count: usize,

    // -------------------------------------------------------------------------
    // TLS Configuration
    // -------------------------------------------------------------------------
    pub tls: TlsConfig,
}

/// TLS parameters of the listening endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsConfig {
    /// Whether connections must complete a TLS handshake before dispatch
    pub enable: bool,

    /// PEM bundle holding the server certificate chain and private key
    pub keyfile: Option<PathBuf>,

    /// CA certificate used to verify client certificates
    pub cacert: Option<PathBuf>,

    /// Diffie-Hellman parameters file
    pub dh: Option<PathBuf>,

    /// Passphrase protecting the key file
    pub password: Option<String>,
}

/// How the TLS endpoint authenticates peers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsAuthMode {
    /// No key material configured: anonymous server certificate, no client auth
    NoAuthentication,

    /// Key material configured: configured certificate, verify clients if a CA is set
    Verify,
}

impl TlsConfig {
    /// Select the authentication mode from the supplied key material
    pub fn auth_mode(&self) -> TlsAuthMode {
        if self.keyfile.is_none()
            && self.cacert.is_none()
            && self.dh.is_none()
            && self.password.is_none()
        {
            TlsAuthMode::NoAuthentication
        } else {
            TlsAuthMode::Verify
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 4242,
            backlog: 100,
            accept_timeout_ms: 500,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
            handshake_timeout_ms: 5000,
            thread_count: 1,
            tls: TlsConfig::default(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load a configuration from a JSON file
    ///
    /// Missing keys keep their defaults, unknown keys are rejected.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            GateError::Config(format!("cannot read `{}': {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    /// Parse a configuration from a JSON document
    pub fn from_json(raw: &str) -> Result<Self> {
        let file: ConfigFile = serde_json::from_str(raw)?;
        let config = file.into_config();
        config.validate()?;
        Ok(config)
    }

    /// Check invariants the server relies on
    pub fn validate(&self) -> Result<()> {
        if self.thread_count == 0 {
            return Err(GateError::Config(
                "thread_count must be at least 1".to_string(),
            ));
        }
        if self.accept_timeout_ms == 0 {
            return Err(GateError::Config(
                "accept_timeout must be at least 1 millisecond".to_string(),
            ));
        }
        if self.handshake_timeout_ms == 0 {
            return Err(GateError::Config(
                "handshake_timeout must be at least 1 millisecond".to_string(),
            ));
        }
        Ok(())
    }

    /// Address string handed to the listener
    pub fn bind_addr(&self) -> String {
        let host = if self.host.is_empty() {
            "0.0.0.0"
        } else {
            self.host.as_str()
        };
        format!("{}:{}", host, self.port)
    }

    pub fn accept_timeout(&self) -> Duration {
        Duration::from_millis(self.accept_timeout_ms)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_ms > 0).then(|| Duration::from_millis(self.read_timeout_ms))
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        (self.write_timeout_ms > 0).then(|| Duration::from_millis(self.write_timeout_ms))
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the bind host (empty for all interfaces)
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the bind port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the maximum number of concurrently served connections
    pub fn thread_count(mut self, count: usize) -> Self {
        self.config.thread_count = count;
        self
    }

    /// Set the accept timeout (in milliseconds)
    pub fn accept_timeout_ms(mut self, ms: u64) -> Self {
        self.config.accept_timeout_ms = ms;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the TLS handshake deadline (in milliseconds)
    pub fn handshake_timeout_ms(mut self, ms: u64) -> Self {
        self.config.handshake_timeout_ms = ms;
        self
    }

    /// Replace the TLS parameters
    pub fn tls(mut self, tls: TlsConfig) -> Self {
        self.config.tls = tls;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

// =============================================================================
// File Format
// =============================================================================

/// On-disk layout, keys named after the webservice configuration tree
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    host: Option<String>,
    port: Option<u16>,
    thread_count: Option<usize>,
    /// milliseconds
    accept_timeout: Option<u64>,
    /// seconds
    recv_timeout: Option<u64>,
    /// seconds
    send_timeout: Option<u64>,
    /// milliseconds
    handshake_timeout: Option<u64>,
    ssl: Option<SslSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SslSection {
    #[serde(default)]
    enable: bool,
    keyfile: Option<String>,
    cacert: Option<String>,
    dh: Option<String>,
    password: Option<String>,
}

/// Empty strings in the file mean "not set"
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl ConfigFile {
    fn into_config(self) -> Config {
        let mut config = Config::default();
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(count) = self.thread_count {
            config.thread_count = count;
        }
        if let Some(ms) = self.accept_timeout {
            config.accept_timeout_ms = ms;
        }
        if let Some(secs) = self.recv_timeout {
            config.read_timeout_ms = secs * 1000;
        }
        if let Some(secs) = self.send_timeout {
            config.write_timeout_ms = secs * 1000;
        }
        if let Some(ms) = self.handshake_timeout {
            config.handshake_timeout_ms = ms;
        }
        if let Some(ssl) = self.ssl {
            config.tls = TlsConfig {
                enable: ssl.enable,
                keyfile: non_empty(ssl.keyfile).map(PathBuf::from),
                cacert: non_empty(ssl.cacert).map(PathBuf::from),
                dh: non_empty(ssl.dh).map(PathBuf::from),
                password: non_empty(ssl.password),
            };
        }
        config
    }
}
