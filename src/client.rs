//! Blocking RPC client
//!
//! One connection, one request/response exchange per `call`: the server
//! closes every connection after answering it.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rustls::crypto::ring;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};

use crate::error::{GateError, Result};
use crate::network::load_certs;
use crate::protocol::{read_response, write_request, Request, Response};

enum ClientStream {
    Plain(TcpStream),
    Tls(Box<StreamOwned<ClientConnection, TcpStream>>),
}

impl Read for ClientStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ClientStream::Plain(stream) => stream.read(buf),
            ClientStream::Tls(stream) => stream.read(buf),
        }
    }
}

impl Write for ClientStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            ClientStream::Plain(stream) => stream.write(buf),
            ClientStream::Tls(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            ClientStream::Plain(stream) => stream.flush(),
            ClientStream::Tls(stream) => stream.flush(),
        }
    }
}

/// TLS parameters reused for every connection
struct TlsTarget {
    config: Arc<ClientConfig>,
    server_name: ServerName<'static>,
}

/// Client for an rpcgate server
pub struct Client {
    addrs: Vec<SocketAddr>,
    tls: Option<TlsTarget>,
    timeout: Option<Duration>,
}

impl Client {
    /// Resolve the server address for plain TCP calls
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        Ok(Self {
            addrs: resolve(addr)?,
            tls: None,
            timeout: None,
        })
    }

    /// Resolve the server address for TLS calls, trusting the certificates in `cacert`
    pub fn connect_tls(addr: impl ToSocketAddrs, server_name: &str, cacert: &Path) -> Result<Self> {
        let mut roots = RootCertStore::empty();
        for cert in load_certs(cacert)? {
            roots.add(cert)?;
        }

        let config = ClientConfig::builder_with_provider(Arc::new(ring::default_provider()))
            .with_safe_default_protocol_versions()?
            .with_root_certificates(roots)
            .with_no_client_auth();

        let server_name = ServerName::try_from(server_name.to_string())
            .map_err(|e| GateError::Tls(format!("invalid server name `{}': {}", server_name, e)))?;

        Ok(Self {
            addrs: resolve(addr)?,
            tls: Some(TlsTarget {
                config: Arc::new(config),
                server_name,
            }),
            timeout: None,
        })
    }

    /// Read and write timeout applied to every connection
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    /// Open a connection, send one request and wait for its response
    pub fn call(&mut self, request: &Request) -> Result<Response> {
        let mut stream = self.open()?;
        write_request(&mut stream, request)?;
        let response = read_response(&mut stream)?;

        if let ClientStream::Tls(tls) = &mut stream {
            tls.conn.send_close_notify();
            let _ = tls.flush();
        }
        Ok(response)
    }

    fn open(&self) -> Result<ClientStream> {
        let stream = TcpStream::connect(&self.addrs[..])?;
        stream.set_nodelay(true)?;
        stream.set_read_timeout(self.timeout)?;
        stream.set_write_timeout(self.timeout)?;

        match &self.tls {
            None => Ok(ClientStream::Plain(stream)),
            Some(tls) => {
                let conn = ClientConnection::new(Arc::clone(&tls.config), tls.server_name.clone())?;
                Ok(ClientStream::Tls(Box::new(StreamOwned::new(conn, stream))))
            }
        }
    }
}

fn resolve(addr: impl ToSocketAddrs) -> Result<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = addr.to_socket_addrs()?.collect();
    if addrs.is_empty() {
        return Err(GateError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            "address resolved to nothing",
        )));
    }
    Ok(addrs)
}
