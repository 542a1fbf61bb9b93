//! Connection task
//!
//! Wraps one accepted connection for the worker pool. A task serves a
//! single request/response exchange, then closes the connection.

use std::sync::Arc;

use crate::pool::Task;

use super::{Connection, ServerStats};

/// One accepted connection awaiting or undergoing service
pub struct ConnectionTask {
    connection: Connection,
    stats: Arc<ServerStats>,
}

impl ConnectionTask {
    pub fn new(connection: Connection, stats: Arc<ServerStats>) -> Self {
        Self { connection, stats }
    }
}

impl Task for ConnectionTask {
    fn run(self: Box<Self>) {
        let ConnectionTask {
            mut connection,
            stats,
        } = *self;

        if let Err(e) = connection.handle() {
            tracing::debug!(peer = %connection.peer_addr(), error = %e, "Connection ended with error");
        }
        stats.record_served();
        // connection dropped here: transport closed before the slot is freed
    }
}
