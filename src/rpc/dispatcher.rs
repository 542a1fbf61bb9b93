//! Request dispatcher
//!
//! Maps each [`Request`] onto the configuration graph.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::RpcError;
use crate::gate::AdmissionGate;
use crate::graph::{DowntimeSpec, SharedGraph};
use crate::protocol::{Request, Response};

use super::{run_guarded, Service};

/// Process-level requests raised by RPC calls and observed by the binary
#[derive(Debug, Default)]
pub struct EngineSignals {
    shutdown: AtomicBool,
    restart: AtomicBool,
}

impl EngineSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    pub fn request_restart(&self) {
        self.restart.store(true, Ordering::Release);
    }

    /// Consume a pending restart request
    pub fn take_restart(&self) -> bool {
        self.restart.swap(false, Ordering::AcqRel)
    }
}

/// Gate-guarded RPC handlers over a shared graph
pub struct Dispatcher {
    gate: Arc<dyn AdmissionGate>,
    graph: SharedGraph,
    signals: Arc<EngineSignals>,
}

impl Dispatcher {
    pub fn new(gate: Arc<dyn AdmissionGate>, graph: SharedGraph) -> Self {
        Self {
            gate,
            graph,
            signals: Arc::new(EngineSignals::new()),
        }
    }

    pub fn graph(&self) -> &SharedGraph {
        &self.graph
    }

    pub fn gate(&self) -> &Arc<dyn AdmissionGate> {
        &self.gate
    }

    pub fn signals(&self) -> Arc<EngineSignals> {
        Arc::clone(&self.signals)
    }

    /// Execute one request; the caller holds the gate
    fn execute(&self, request: Request) -> Result<Response, RpcError> {
        let response = match request {
            Request::Ping => Response::ok(),

            Request::Get { target, field } => {
                let graph = self.graph.read();
                Response::value(graph.get_field(&target, &field)?)
            }

            Request::Set {
                target,
                field,
                value,
            } => {
                self.graph.write().set_field(&target, &field, value)?;
                Response::ok()
            }

            Request::AddHost { name, address } => {
                self.graph.write().add_host(&name, &address)?;
                Response::ok()
            }

            Request::AddService { host, description } => {
                self.graph.write().add_service(&host, &description)?;
                Response::ok()
            }

            Request::AddContact { name, email } => {
                self.graph.write().add_contact(&name, &email)?;
                Response::ok()
            }

            Request::ScheduleDowntime {
                host,
                service,
                start,
                end,
                author,
                comment,
            } => {
                let id = self.graph.write().schedule_downtime(DowntimeSpec {
                    host,
                    service,
                    start,
                    end,
                    author,
                    comment,
                })?;
                Response::id(id)
            }

            Request::DeleteDowntime { id } => {
                self.graph.write().delete_downtime(id)?;
                Response::ok()
            }

            Request::List { kind } => Response::names(self.graph.read().names(kind)),

            Request::ProcessShutdown => {
                tracing::info!("Webservice: program shutting down...");
                self.signals.request_shutdown();
                Response::ok()
            }

            Request::ProcessRestart => {
                tracing::info!("Webservice: program restarting...");
                self.signals.request_restart();
                Response::ok()
            }
        };
        Ok(response)
    }
}

impl Service for Dispatcher {
    fn call(&self, request: Request) -> Response {
        let name = request.name();
        tracing::debug!(handler = name, ?request, "Webservice call");

        match run_guarded(self.gate.as_ref(), name, || self.execute(request)) {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(handler = name, error = %e, "Webservice call failed");
                Response::from(e)
            }
        }
    }
}
