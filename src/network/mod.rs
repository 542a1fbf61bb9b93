//! Network Module
//!
//! TCP server and client connection handling.
//!
//! ## Architecture
//! - Single acceptor thread
//! - Worker thread pool for connections (bounded by `thread_count`)
//! - Requests routed through an `rpc::Service`

mod connection;
mod server;
mod stats;
mod task;
mod tls;
mod transport;

pub use connection::Connection;
pub use server::{
    classify_accept_error, AcceptFailure, Server, ServerHandle, ServerState, ShutdownHandle,
};
pub use stats::{ServerStats, StatsSnapshot};
pub use task::ConnectionTask;
pub use tls::{generate_self_signed_cert, load_certs, load_private_key, TlsAcceptor};
pub use transport::Transport;
