//! TCP Server
//!
//! Accepts connections and dispatches them to the worker pool.
//!
//! ## Lifecycle
//! ```text
//! Initializing ──bind()──► Accepting ──stop / fatal accept──► Draining ──► Stopped
//! ```
//!
//! - `bind()` builds the TLS context and the listener; failures abort startup
//! - Accepting runs on a single thread; each connection is configured (and
//!   TLS-handshaked) there, then moved into a [`ConnectionTask`]
//! - Draining waits for every dispatched task, then drains the gate
//! - Stopped releases the listener

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::error::{GateError, Result};
use crate::gate::AdmissionGate;
use crate::pool::WorkerPool;
use crate::rpc::Service;

use super::{Connection, ConnectionTask, ServerStats, StatsSnapshot, TlsAcceptor, Transport};

/// Sleep between non-blocking accept attempts
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Server lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ServerState {
    Initializing = 0,
    Accepting = 1,
    Draining = 2,
    Stopped = 3,
}

impl ServerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ServerState::Initializing,
            1 => ServerState::Accepting,
            2 => ServerState::Draining,
            _ => ServerState::Stopped,
        }
    }
}

/// How the accept loop treats an accept failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptFailure {
    /// Nothing pending, interrupted, or the peer gave up: try again
    Transient,
    /// The listener itself is unusable: leave the accept loop
    Fatal,
}

/// Classify an error returned by `TcpListener::accept`
pub fn classify_accept_error(error: &io::Error) -> AcceptFailure {
    match error.kind() {
        io::ErrorKind::WouldBlock
        | io::ErrorKind::Interrupted
        | io::ErrorKind::TimedOut
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset => AcceptFailure::Transient,
        _ => AcceptFailure::Fatal,
    }
}

/// Cloneable trigger for the termination flag
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Ask the accept loop to stop; in-flight tasks still complete
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// TCP server for rpcgate
pub struct Server {
    config: Config,

    /// Released when the server reaches `Stopped`
    listener: Option<TcpListener>,

    local_addr: SocketAddr,

    /// Present when TLS is enabled
    tls: Option<TlsAcceptor>,

    gate: Arc<dyn AdmissionGate>,

    service: Arc<dyn Service>,

    shutdown: ShutdownHandle,

    state: Arc<AtomicU8>,

    stats: Arc<ServerStats>,
}

impl Server {
    /// Initialize the server: TLS context first, then the listening socket
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * the configuration is invalid
    /// * the TLS context cannot be created
    /// * the address cannot be bound
    pub fn bind(
        config: Config,
        gate: Arc<dyn AdmissionGate>,
        service: Arc<dyn Service>,
    ) -> Result<Self> {
        config.validate()?;

        let tls = if config.tls.enable {
            Some(TlsAcceptor::from_config(&config.tls).map_err(|e| {
                GateError::Tls(format!(
                    "create ssl context with host `{}' on port `{}' failed: {}",
                    config.host, config.port, e
                ))
            })?)
        } else {
            None
        };

        let addr = config.bind_addr();
        let listener = TcpListener::bind(&addr).map_err(|source| GateError::Bind {
            addr: addr.clone(),
            source,
        })?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        tracing::info!(
            addr = %local_addr,
            threads = config.thread_count,
            tls = tls.is_some(),
            backlog = config.backlog,
            "Webservice listening"
        );

        Ok(Self {
            config,
            listener: Some(listener),
            local_addr,
            tls,
            gate,
            service,
            shutdown: ShutdownHandle {
                flag: Arc::new(AtomicBool::new(false)),
            },
            state: Arc::new(AtomicU8::new(ServerState::Initializing as u8)),
            stats: Arc::new(ServerStats::new()),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn state(&self) -> ServerState {
        ServerState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: ServerState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Run the server on a dedicated accept thread
    pub fn spawn(mut self) -> Result<ServerHandle> {
        let shutdown = self.shutdown_handle();
        let local_addr = self.local_addr;
        let stats = Arc::clone(&self.stats);
        let state = Arc::clone(&self.state);

        let thread = thread::Builder::new()
            .name("rpcgate-accept".to_string())
            .spawn(move || self.run())?;

        Ok(ServerHandle {
            thread: Some(thread),
            shutdown,
            local_addr,
            stats,
            state,
        })
    }

    /// Serve until the termination flag is set or accept fails fatally
    ///
    /// Always drains the pool and the gate before returning. Returns the
    /// fatal accept error, if that is what ended the loop.
    pub fn run(&mut self) -> Result<()> {
        let listener = match self.listener.take() {
            Some(listener) => listener,
            None => {
                return Err(GateError::Runtime("server already ran".to_string()));
            }
        };
        let pool = WorkerPool::new(self.config.thread_count)?;

        self.set_state(ServerState::Accepting);
        let outcome = self.accept_loop(&listener, &pool);

        self.set_state(ServerState::Draining);
        tracing::info!(outstanding = pool.outstanding(), "Webservice draining");
        pool.wait_for_done();
        drop(pool);

        self.gate.request_drain();
        self.gate.await_drained();

        drop(listener);
        self.set_state(ServerState::Stopped);
        tracing::info!(stats = ?self.stats.snapshot(), "Webservice stopped");

        outcome
    }

    fn accept_loop(&self, listener: &TcpListener, pool: &WorkerPool) -> Result<()> {
        while !self.shutdown.is_shutdown() {
            let (stream, peer) = match self.accept_one(listener) {
                Ok(Some(accepted)) => accepted,
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!(error = %e, "webservice runtime error `{}'.", e);
                    return Err(GateError::Io(e));
                }
            };
            self.stats.record_accepted();

            let transport = match self.prepare(stream) {
                Ok(transport) => transport,
                Err(e) => {
                    tracing::warn!(peer = %peer, error = %e, "webservice runtime error `{}'.", e);
                    continue;
                }
            };

            // The flag may have been raised while this connection was being set up
            if self.shutdown.is_shutdown() {
                tracing::debug!(peer = %peer, "Shutdown requested, connection not dispatched");
                break;
            }

            let connection = Connection::new(transport, Arc::clone(&self.service), peer.to_string());
            pool.start(ConnectionTask::new(connection, Arc::clone(&self.stats)))?;
            self.stats.record_dispatched();
        }
        Ok(())
    }

    /// Wait up to the accept timeout for one connection
    ///
    /// `Ok(None)` means nothing usable arrived and the loop should re-check
    /// the termination flag.
    fn accept_one(&self, listener: &TcpListener) -> io::Result<Option<(TcpStream, SocketAddr)>> {
        let deadline = Instant::now() + self.config.accept_timeout();
        loop {
            match listener.accept() {
                Ok(accepted) => return Ok(Some(accepted)),
                Err(e) => match classify_accept_error(&e) {
                    AcceptFailure::Fatal => return Err(e),
                    AcceptFailure::Transient if e.kind() == io::ErrorKind::WouldBlock => {
                        let now = Instant::now();
                        if now >= deadline || self.shutdown.is_shutdown() {
                            return Ok(None);
                        }
                        thread::sleep(ACCEPT_POLL_INTERVAL.min(deadline - now));
                    }
                    AcceptFailure::Transient => {
                        tracing::debug!(error = %e, "transient accept failure");
                        return Ok(None);
                    }
                },
            }
        }
    }

    /// Build the per-connection context: socket options, then TLS if enabled
    fn prepare(&self, stream: TcpStream) -> Result<Transport> {
        let configured = stream
            .set_nonblocking(false)
            .and_then(|_| stream.set_nodelay(true))
            .and_then(|_| stream.set_read_timeout(self.config.read_timeout()))
            .and_then(|_| stream.set_write_timeout(self.config.write_timeout()));
        if let Err(e) = configured {
            self.stats.record_rejected();
            return Err(GateError::Io(e));
        }

        match &self.tls {
            None => Ok(Transport::Plain(stream)),
            Some(acceptor) => {
                self.stats.record_handshake();
                acceptor
                    .handshake(stream, self.config.handshake_timeout())
                    .map_err(|e| {
                        self.stats.record_handshake_failure();
                        GateError::Tls(format!("handshake failed: {}", e))
                    })
            }
        }
    }
}

/// Handle to a server running on its own thread
///
/// Dropping the handle stops the server and waits for it to drain.
pub struct ServerHandle {
    thread: Option<JoinHandle<Result<()>>>,
    shutdown: ShutdownHandle,
    local_addr: SocketAddr,
    stats: Arc<ServerStats>,
    state: Arc<AtomicU8>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn state(&self) -> ServerState {
        ServerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Whether the accept thread has exited (stopped or failed)
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Stop accepting, wait for every in-flight connection, release the listener
    pub fn stop(mut self) -> Result<()> {
        self.shutdown.shutdown();
        self.join()
    }

    /// Wait for the server thread without requesting a stop
    pub fn join(&mut self) -> Result<()> {
        match self.thread.take() {
            Some(thread) => thread
                .join()
                .map_err(|_| GateError::Runtime("server thread panicked".to_string()))?,
            None => Ok(()),
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.shutdown.shutdown();
            if let Err(e) = self.join() {
                tracing::error!(error = %e, "server stopped with error");
            }
        }
    }
}
