//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{BufReader, ErrorKind};
use std::sync::Arc;

use crate::error::{GateError, Result};
use crate::protocol::{read_request, write_response, Response};
use crate::rpc::Service;

use super::Transport;

/// Per-connection protocol context
///
/// Owns its transport exclusively; dropping the connection closes it.
pub struct Connection {
    /// Transport, buffered for reads; writes go through `get_mut()`
    stream: BufReader<Transport>,

    /// Handler for decoded requests
    service: Arc<dyn Service>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler over an already configured transport
    pub fn new(transport: Transport, service: Arc<dyn Service>, peer_addr: String) -> Self {
        Self {
            stream: BufReader::new(transport),
            service,
            peer_addr,
        }
    }

    /// Serve exactly one request/response exchange
    ///
    /// Returns once the response is written, or earlier if the client
    /// disconnects, the read timeout expires or an error occurs. The caller
    /// drops the connection afterwards, which closes the transport.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!(
            peer = %self.peer_addr,
            tls = self.stream.get_ref().is_tls(),
            "Connection established"
        );

        let request = match read_request(&mut self.stream) {
            Ok(request) => request,
            Err(GateError::Io(ref e)) if is_disconnect(e.kind()) => {
                tracing::debug!(peer = %self.peer_addr, kind = ?e.kind(), "Client disconnected");
                return Ok(());
            }
            Err(GateError::Io(ref e)) if is_timeout(e.kind()) => {
                tracing::debug!(peer = %self.peer_addr, "Read timeout");
                return Ok(());
            }
            Err(e) => {
                tracing::warn!(peer = %self.peer_addr, error = %e, "Error reading request");
                // Answer with a fault if the peer is still listening
                let _ = self.send_response(&Response::runtime_error(&e.to_string()));
                return Err(e);
            }
        };

        tracing::trace!(peer = %self.peer_addr, ?request, "Received request");

        let response = self.service.call(request);

        if let Err(e) = self.send_response(&response) {
            if let GateError::Io(ref io_err) = e {
                if is_disconnect(io_err.kind()) || io_err.kind() == ErrorKind::BrokenPipe {
                    tracing::debug!(
                        peer = %self.peer_addr,
                        error = %e,
                        "Client disconnected before response could be sent"
                    );
                    return Ok(());
                }
            }
            tracing::warn!(peer = %self.peer_addr, error = %e, "Error writing response");
            return Err(e);
        }
        Ok(())
    }

    /// Send a response to the client
    fn send_response(&mut self, response: &Response) -> Result<()> {
        write_response(self.stream.get_mut(), response)
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.stream.get_mut().close();
    }
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UnexpectedEof | ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted
    )
}

/// Read timeout (Windows reports TimedOut instead of WouldBlock)
fn is_timeout(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::WouldBlock | ErrorKind::TimedOut)
}
