//! TCP listening server and connection registry
//!
//! Each call to [`LogServer::start`] is one server generation: it binds the
//! listener, gets its own shutdown token, and owns the connections it accepts.
//! [`ServerHandle::close`] cancels the generation and waits (bounded) for every
//! connection task before returning.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};

use cutelog_core::prelude::*;

use crate::benchmark::{SyntheticBenchmarkSource, BENCHMARK_CONN_ID};
use crate::connection::SocketRecordSource;
use crate::event::{
    ConnectionControl, ConnectionId, ConnectionInfo, ServerEvent, ShutdownReport, SourceKind,
};
use crate::format::SerializationFormat;
use crate::frame::DEFAULT_MAX_FRAME_LEN;
use crate::source::{drive, RecordSink, RecordSource, FINISH_GRACE, POLL_INTERVAL};

/// Default TCP port clients connect to
pub const DEFAULT_PORT: u16 = 19996;

/// Socket connection ids start at 1; 0 belongs to the benchmark source.
static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

fn next_connection_id() -> ConnectionId {
    NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed)
}

/// Server parameters, fixed for the lifetime of one generation
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Format new connections start in
    pub default_format: SerializationFormat,
    /// Start a synthetic benchmark source alongside the listener
    pub benchmark: bool,
    pub benchmark_interval: Duration,
    /// How long `close` waits for connections before aborting them
    pub shutdown_timeout: Duration,
    /// Largest frame payload accepted from a client
    pub max_frame_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            default_format: SerializationFormat::default(),
            benchmark: false,
            benchmark_interval: Duration::from_micros(500),
            shutdown_timeout: Duration::from_millis(1500),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

struct ActiveConnection {
    control: ConnectionControl,
    handle: JoinHandle<()>,
    benchmark: bool,
}

type Registry = Arc<Mutex<HashMap<ConnectionId, ActiveConnection>>>;

fn lock(registry: &Registry) -> MutexGuard<'_, HashMap<ConnectionId, ActiveConnection>> {
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// State shared by the accept loop and connection tasks of one generation
#[derive(Clone)]
struct Generation {
    events: mpsc::Sender<ServerEvent>,
    registry: Registry,
    shutdown: watch::Receiver<bool>,
    default_format: SerializationFormat,
    max_frame_len: usize,
}

impl Generation {
    /// Announce a connection to the controller, then spawn its task.
    ///
    /// The announcement is awaited before the task exists, so the controller
    /// always sees `ConnectionOpened` ahead of the connection's first record.
    async fn open<S>(&self, id: ConnectionId, kind: SourceKind, source: S) -> bool
    where
        S: RecordSource + 'static,
    {
        let control = ConnectionControl::new();
        let info = ConnectionInfo {
            id,
            kind,
            control: control.clone(),
        };
        if self
            .events
            .send(ServerEvent::ConnectionOpened(info))
            .await
            .is_err()
        {
            warn!("Controller is gone, dropping connection id={}", id);
            return false;
        }

        let sink = RecordSink::new(
            id,
            control.clone(),
            self.shutdown.clone(),
            self.events.clone(),
        );
        let registry = self.registry.clone();
        let shutdown = self.shutdown.clone();

        // Hold the lock across spawn so the task cannot deregister before insertion.
        let mut active = lock(&self.registry);
        let handle = tokio::spawn(async move {
            drive(source, sink).await;
            cleanup_connection(&registry, &shutdown, id);
        });
        active.insert(
            id,
            ActiveConnection {
                control,
                handle,
                benchmark: kind == SourceKind::Benchmark,
            },
        );
        true
    }
}

fn cleanup_connection(registry: &Registry, shutdown: &watch::Receiver<bool>, id: ConnectionId) {
    let removed = lock(registry).remove(&id).is_some();
    // During close the registry has already been drained.
    if !removed && !*shutdown.borrow() {
        error!("Double delete on connection id={}", id);
    }
}

/// Entry point for starting server generations
pub struct LogServer;

impl LogServer {
    /// Bind the listener and start accepting.
    ///
    /// Bind failure is reported to the caller and nothing is left running.
    pub async fn start(
        config: ServerConfig,
        events: mpsc::Sender<ServerEvent>,
    ) -> Result<ServerHandle> {
        info!("Starting the server");
        let address = config.address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| Error::bind(&address, e.to_string()))?;
        let local_addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let generation = Generation {
            events,
            registry: Arc::new(Mutex::new(HashMap::new())),
            shutdown: shutdown_rx,
            default_format: config.default_format,
            max_frame_len: config.max_frame_len,
        };

        if config.benchmark {
            debug!("Starting a benchmark connection");
            let source = SyntheticBenchmarkSource::new(config.benchmark_interval);
            generation
                .open(BENCHMARK_CONN_ID, SourceKind::Benchmark, source)
                .await;
        }

        let registry = generation.registry.clone();
        let events = generation.events.clone();
        let accept_task = tokio::spawn(accept_loop(listener, generation));
        info!("Server is listening on {}", local_addr);

        Ok(ServerHandle {
            local_addr,
            shutdown_tx,
            accept_task,
            registry,
            events,
            shutdown_timeout: config.shutdown_timeout,
        })
    }
}

async fn accept_loop(listener: TcpListener, generation: Generation) {
    let mut shutdown = generation.shutdown.clone();
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let id = next_connection_id();
                    info!("New connection id={} from {}", id, peer);
                    let source = SocketRecordSource::new(stream, generation.default_format)
                        .with_max_frame_len(generation.max_frame_len);
                    if !generation.open(id, SourceKind::Socket { peer }, source).await {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Accepting a connection failed: {}", e);
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            }
        }
    }
    debug!("Listener on {:?} has stopped", listener.local_addr().ok());
}

/// A running server generation
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    accept_task: JoinHandle<()>,
    registry: Registry,
    events: mpsc::Sender<ServerEvent>,
    shutdown_timeout: Duration,
}

impl ServerHandle {
    /// The bound address (resolves port 0 to the assigned port)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn connection_count(&self) -> usize {
        lock(&self.registry).len()
    }

    pub fn has_connection(&self, id: ConnectionId) -> bool {
        lock(&self.registry).contains_key(&id)
    }

    /// Ask the benchmark source, if any, to stop. Returns whether one was running.
    pub fn stop_benchmark(&self) -> bool {
        let active = lock(&self.registry);
        let mut found = false;
        for conn in active.values().filter(|c| c.benchmark) {
            conn.control.close_tab();
            conn.control.request_stop();
            found = true;
        }
        found
    }

    /// Stop accepting, cancel every connection, and wait for them.
    ///
    /// Connections still running when the shutdown timeout expires are aborted
    /// and listed in the report. The report is also sent to the controller as
    /// [`ServerEvent::ServerStopped`], behind every event the generation produced.
    pub async fn close(self) -> ShutdownReport {
        info!("Stopping the server");
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.accept_task.await {
            warn!("Accept loop ended abnormally: {}", e);
        }

        let active: Vec<(ConnectionId, ActiveConnection)> =
            lock(&self.registry).drain().collect();
        for (_, conn) in &active {
            conn.control.request_stop();
        }
        debug!("Waiting for {} connections to stop", active.len());

        let deadline = Instant::now() + self.shutdown_timeout;
        let mut report = ShutdownReport::default();
        for (id, mut conn) in active {
            match timeout_at(deadline, &mut conn.handle).await {
                Ok(Ok(())) => report.stopped.push(id),
                Ok(Err(e)) => {
                    warn!("Connection id={} task failed: {}", id, e);
                    report.stopped.push(id);
                }
                Err(_) => {
                    error!("Connection id={} didn't stop in time, aborting", id);
                    conn.handle.abort();
                    report.aborted.push(id);
                }
            }
        }

        let stopped = ServerEvent::ServerStopped(report.clone());
        match tokio::time::timeout(FINISH_GRACE, self.events.send(stopped)).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => debug!("Controller is gone, not reporting server stop"),
            Err(_) => warn!("Could not report server stop in time"),
        }

        info!("Server has stopped");
        report
    }
}
