//! rpcgate Server Binary
//!
//! Serves the configuration graph until SIGINT/SIGTERM or a shutdown RPC.
//! SIGHUP or a restart RPC drains the server, reloads the object file and
//! starts serving again.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use rpcgate::{AdmissionGate, Config, ConfigGraph, Dispatcher, Gate, Server, SharedGraph};
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
use tracing_subscriber::{fmt, EnvFilter};

/// How often the main thread checks signals and RPC requests
const SUPERVISE_INTERVAL: Duration = Duration::from_millis(100);

/// rpcgate Server
#[derive(Parser, Debug)]
#[command(name = "rpcgate-server")]
#[command(about = "RPC server for a monitoring configuration graph")]
#[command(version)]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON object file loaded into the graph (reloaded on restart)
    #[arg(short, long)]
    objects: Option<PathBuf>,

    /// Override the bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the worker thread count
    #[arg(short, long)]
    threads: Option<usize>,
}

/// Why the serving loop ended
enum Exit {
    Shutdown,
    Restart,
    Failed,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,rpcgate=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("rpcgate Server v{}", rpcgate::VERSION);

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let graph = match load_graph(&args) {
        Ok(graph) => graph.into_shared(),
        Err(e) => {
            tracing::error!("Failed to load objects: {}", e);
            std::process::exit(1);
        }
    };

    // Signal flags
    let terminate = Arc::new(AtomicBool::new(false));
    let reload = Arc::new(AtomicBool::new(false));
    let registered = signal_hook::flag::register(SIGINT, Arc::clone(&terminate))
        .and_then(|_| signal_hook::flag::register(SIGTERM, Arc::clone(&terminate)))
        .and_then(|_| signal_hook::flag::register(SIGHUP, Arc::clone(&reload)));
    if let Err(e) = registered {
        tracing::error!("Failed to install signal handlers: {}", e);
        std::process::exit(1);
    }

    let gate = Arc::new(Gate::new());

    loop {
        match serve(&config, &gate, &graph, &terminate, &reload) {
            Exit::Shutdown => break,
            Exit::Failed => std::process::exit(1),
            Exit::Restart => {
                tracing::info!("Restarting webservice");
                if args.objects.is_some() {
                    match load_graph(&args) {
                        Ok(fresh) => *graph.write() = fresh,
                        Err(e) => tracing::error!("Reload failed, keeping current objects: {}", e),
                    }
                }
                gate.reopen();
            }
        }
    }

    tracing::info!("Server stopped");
}

/// Run one server instance until it must stop
fn serve(
    config: &Config,
    gate: &Arc<Gate>,
    graph: &SharedGraph,
    terminate: &AtomicBool,
    reload: &AtomicBool,
) -> Exit {
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(gate) as Arc<dyn AdmissionGate>,
        Arc::clone(graph),
    ));
    let signals = dispatcher.signals();

    let server = match Server::bind(config.clone(), Arc::clone(gate) as Arc<dyn AdmissionGate>, dispatcher) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start webservice: {}", e);
            return Exit::Failed;
        }
    };

    let handle = match server.spawn() {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!("Failed to spawn accept thread: {}", e);
            return Exit::Failed;
        }
    };

    tracing::info!("Webservice ready on {}", handle.local_addr());

    let exit = loop {
        if terminate.load(Ordering::Relaxed) || signals.shutdown_requested() {
            tracing::info!("Shutdown requested, draining...");
            break Exit::Shutdown;
        }
        if reload.swap(false, Ordering::Relaxed) || signals.take_restart() {
            break Exit::Restart;
        }
        if handle.is_finished() {
            break Exit::Failed;
        }
        thread::sleep(SUPERVISE_INTERVAL);
    };

    match handle.stop() {
        Ok(()) => exit,
        Err(e) => {
            tracing::error!("Server error: {}", e);
            Exit::Failed
        }
    }
}

fn load_config(args: &Args) -> rpcgate::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(threads) = args.threads {
        config.thread_count = threads;
    }
    config.validate()?;
    Ok(config)
}

fn load_graph(args: &Args) -> rpcgate::Result<ConfigGraph> {
    match &args.objects {
        Some(path) => ConfigGraph::load(path),
        None => Ok(ConfigGraph::new()),
    }
}
