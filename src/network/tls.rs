//! TLS setup for the listening endpoint
//!
//! Builds one immutable rustls `ServerConfig` at startup; every accepted
//! connection gets its own `ServerConnection` from it.

use std::fs;
use std::io::{self, BufReader, Cursor};
use std::net::TcpStream;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rustls::crypto::ring;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig, ServerConnection, StreamOwned};

use crate::config::TlsConfig;
use crate::error::{GateError, Result};

use super::Transport;

const LOCALHOST_DOMAIN: &str = "localhost";

/// Performs server-side TLS handshakes on accepted sockets
#[derive(Clone)]
pub struct TlsAcceptor {
    config: Arc<ServerConfig>,
}

impl TlsAcceptor {
    /// Create the TLS context from the endpoint configuration
    ///
    /// # Errors
    ///
    /// Returns `GateError::Tls` if:
    /// * the key file or CA certificate cannot be read or parsed
    /// * a passphrase is configured (encrypted keys are not supported)
    /// * rustls rejects the certificate/key pair
    pub fn from_config(tls: &TlsConfig) -> Result<Self> {
        if tls.password.is_some() {
            return Err(GateError::Tls(
                "encrypted key files are not supported, remove the password".to_string(),
            ));
        }
        if let Some(dh) = &tls.dh {
            tracing::warn!(
                dh = %dh.display(),
                "Diffie-Hellman parameters ignored, only ECDHE key exchange is offered"
            );
        }

        let (certs, key) = match &tls.keyfile {
            Some(path) => (load_certs(path)?, load_private_key(path)?),
            None => generate_self_signed_cert(vec![LOCALHOST_DOMAIN.to_string()])?,
        };

        let provider = Arc::new(ring::default_provider());
        let builder = ServerConfig::builder_with_provider(Arc::clone(&provider))
            .with_safe_default_protocol_versions()?;

        let builder = match &tls.cacert {
            Some(path) => {
                let mut roots = RootCertStore::empty();
                for cert in load_certs(path)? {
                    roots.add(cert)?;
                }
                let verifier = WebPkiClientVerifier::builder_with_provider(Arc::new(roots), provider)
                    .build()
                    .map_err(|e| GateError::Tls(e.to_string()))?;
                builder.with_client_cert_verifier(verifier)
            }
            None => builder.with_no_client_auth(),
        };

        let config = builder.with_single_cert(certs, key)?;

        tracing::info!(
            mode = ?tls.auth_mode(),
            client_auth = tls.cacert.is_some(),
            "TLS context created"
        );
        if tls.keyfile.is_none() {
            tracing::debug!("using a generated self-signed certificate for `{}'", LOCALHOST_DOMAIN);
        }

        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// Run the server handshake to completion on a blocking socket
    ///
    /// The whole handshake must finish within `timeout`, whatever the
    /// socket's own timeouts are; those are restored once it succeeds.
    pub fn handshake(&self, mut stream: TcpStream, timeout: Duration) -> io::Result<Transport> {
        let read_timeout = stream.read_timeout()?;
        let write_timeout = stream.write_timeout()?;
        let deadline = Instant::now() + timeout;

        let mut conn = ServerConnection::new(Arc::clone(&self.config))
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        while conn.is_handshaking() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "TLS handshake timed out",
                ));
            }
            stream.set_read_timeout(Some(remaining))?;
            stream.set_write_timeout(Some(remaining))?;

            let (read, written) = conn.complete_io(&mut stream)?;
            if read == 0 && written == 0 && conn.is_handshaking() {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "peer closed during TLS handshake",
                ));
            }
        }

        stream.set_read_timeout(read_timeout)?;
        stream.set_write_timeout(write_timeout)?;
        Ok(Transport::Tls(Box::new(StreamOwned::new(conn, stream))))
    }
}

/// Generate a self-signed certificate for `alt_names`
pub fn generate_self_signed_cert(
    alt_names: Vec<String>,
) -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>)> {
    let cert = rcgen::generate_simple_self_signed(alt_names)
        .map_err(|e| GateError::Tls(format!("certificate generation failed: {}", e)))?;

    let cert_pem = cert.cert.pem();
    let key_pem = cert.signing_key.serialize_pem();

    let certs = load_certs_from_reader(&mut Cursor::new(cert_pem.as_bytes()))?;
    let key = load_key_from_reader(&mut Cursor::new(key_pem.as_bytes()))?;
    Ok((certs, key))
}

/// Load every PEM certificate in a file
pub fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let file = fs::File::open(path)
        .map_err(|e| GateError::Tls(format!("cannot open `{}': {}", path.display(), e)))?;
    let certs = load_certs_from_reader(&mut BufReader::new(file))?;
    if certs.is_empty() {
        return Err(GateError::Tls(format!(
            "no certificate found in `{}'",
            path.display()
        )));
    }
    Ok(certs)
}

/// Load the first PEM private key in a file
pub fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    let file = fs::File::open(path)
        .map_err(|e| GateError::Tls(format!("cannot open `{}': {}", path.display(), e)))?;
    load_key_from_reader(&mut BufReader::new(file))
}

fn load_certs_from_reader(rd: &mut dyn io::BufRead) -> Result<Vec<CertificateDer<'static>>> {
    rustls_pemfile::certs(rd)
        .collect::<io::Result<Vec<_>>>()
        .map_err(|e| GateError::Tls(format!("invalid certificate: {}", e)))
}

fn load_key_from_reader(rd: &mut dyn io::BufRead) -> Result<PrivateKeyDer<'static>> {
    loop {
        let item = rustls_pemfile::read_one(rd)
            .map_err(|e| GateError::Tls(format!("invalid key file: {}", e)))?;
        match item {
            Some(rustls_pemfile::Item::Pkcs1Key(key)) => return Ok(key.into()),
            Some(rustls_pemfile::Item::Pkcs8Key(key)) => return Ok(key.into()),
            Some(rustls_pemfile::Item::Sec1Key(key)) => return Ok(key.into()),
            None => break,
            _ => {}
        }
    }
    Err(GateError::Tls(
        "no private key found (encrypted keys not supported)".to_string(),
    ))
}
