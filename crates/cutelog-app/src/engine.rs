//! Engine - single owner of the application state
//!
//! Every input (server events, front-end commands, timers, OS signals) is a
//! [`Message`] on one channel. The Engine drains it, runs the TEA update,
//! performs the resulting actions, and broadcasts [`EngineEvent`]s to
//! front-ends. Nothing else mutates tabs or records.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use cutelog_core::prelude::*;
use cutelog_wire::{LogServer, ServerEvent, ServerHandle, ShutdownReport, FINISH_GRACE};

use crate::config::Settings;
use crate::engine_event::EngineEvent;
use crate::handler::{self, UpdateAction};
use crate::message::Message;
use crate::records_io;
use crate::signals;
use crate::state::{AppState, BenchmarkMonitor};

/// Capacity of the message and event channels
const CHANNEL_CAPACITY: usize = 256;

/// Period of the benchmark rate monitor
const MONITOR_PERIOD: Duration =
    Duration::from_millis(1000 / BenchmarkMonitor::TICKS_PER_SECOND);

/// Orchestration engine for cutelog.
///
/// Owns:
/// - TEA state (tabs, records, filters, presets)
/// - The unified message channel
/// - The running server generation, or the one being stopped
/// - The benchmark monitor timer
/// - Event broadcasting for front-ends
pub struct Engine {
    /// TEA application state (the Model)
    pub state: AppState,

    /// Sender half of the unified message channel.
    /// Clone this to give to input sources (front-end, timers).
    pub msg_tx: mpsc::Sender<Message>,

    /// Receiver half of the unified message channel.
    /// The front-end event loop drains messages from here.
    pub msg_rx: mpsc::Receiver<Message>,

    /// Server generations report here; the bridge forwards to `msg_tx`
    server_tx: mpsc::Sender<ServerEvent>,
    bridge: JoinHandle<()>,

    server: Option<ServerHandle>,

    /// Background close of the previous generation
    stopping: Option<JoinHandle<ShutdownReport>>,

    monitor: Option<JoinHandle<()>>,

    /// Event broadcaster for external consumers
    event_tx: broadcast::Sender<EngineEvent>,
}

impl Engine {
    /// Create an Engine with effective `settings`.
    ///
    /// `config_dir` is where presets and default-preset choices are persisted;
    /// None keeps them in memory.
    ///
    /// Must be called inside a Tokio runtime: spawns the server event bridge and
    /// the signal handler.
    pub fn new(settings: Settings, config_dir: Option<PathBuf>) -> Self {
        let state = AppState::new(settings, config_dir);

        let (msg_tx, msg_rx) = mpsc::channel::<Message>(CHANNEL_CAPACITY);
        let (server_tx, server_rx) = mpsc::channel::<ServerEvent>(CHANNEL_CAPACITY);
        let bridge = Self::spawn_server_bridge(server_rx, msg_tx.clone());

        signals::spawn_signal_handler(msg_tx.clone());

        let (event_tx, _) = broadcast::channel(CHANNEL_CAPACITY);

        Self {
            state,
            msg_tx,
            msg_rx,
            server_tx,
            bridge,
            server: None,
            stopping: None,
            monitor: None,
            event_tx,
        }
    }

    /// Forward server events into the message channel, preserving their order
    fn spawn_server_bridge(
        mut server_rx: mpsc::Receiver<ServerEvent>,
        msg_tx: mpsc::Sender<Message>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = server_rx.recv().await {
                if msg_tx.send(Message::Server(event)).await.is_err() {
                    break;
                }
            }
            debug!("Server event bridge has stopped");
        })
    }

    /// Subscribe to engine events.
    ///
    /// If the subscriber falls behind (buffer full), older events are
    /// dropped. Use `broadcast::error::RecvError::Lagged` to detect this.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_tx.subscribe()
    }

    /// Get a clone of the message sender for spawning input sources.
    pub fn msg_sender(&self) -> mpsc::Sender<Message> {
        self.msg_tx.clone()
    }

    pub fn should_quit(&self) -> bool {
        self.state.should_quit()
    }

    /// Run one message through the update cycle, including every follow-up
    /// message and action it produces.
    pub async fn process_message(&mut self, msg: Message) {
        let mut queue = VecDeque::from([msg]);
        while let Some(msg) = queue.pop_front() {
            let result = handler::update(&mut self.state, msg);
            self.flush_events();

            if let Some(action) = result.action {
                if let Some(follow_up) = self.handle_action(action).await {
                    queue.push_back(follow_up);
                }
            }
            if let Some(next) = result.message {
                queue.push_back(next);
            }
        }
    }

    async fn handle_action(&mut self, action: UpdateAction) -> Option<Message> {
        match action {
            UpdateAction::StartServer(config) => {
                let address = config.address();
                match LogServer::start(config, self.server_tx.clone()).await {
                    Ok(handle) => {
                        let addr = handle.local_addr();
                        self.server = Some(handle);
                        Some(Message::ServerStarted { addr })
                    }
                    Err(e) => {
                        warn!("Could not bind {}: {}", address, e);
                        Some(Message::ServerStartFailed {
                            error: e.to_string(),
                        })
                    }
                }
            }

            UpdateAction::StopServer => {
                match self.server.take() {
                    Some(handle) => self.stopping = Some(tokio::spawn(handle.close())),
                    None => warn!("Stop requested but no server is running"),
                }
                None
            }

            UpdateAction::StopBenchmark => {
                let stopped = self
                    .server
                    .as_ref()
                    .is_some_and(|handle| handle.stop_benchmark());
                if !stopped {
                    self.emit(EngineEvent::status("No benchmark is running"));
                }
                None
            }

            UpdateAction::StartMonitor => {
                self.stop_monitor();
                self.monitor = Some(Self::spawn_monitor(self.msg_tx.clone()));
                None
            }

            UpdateAction::StopMonitor => {
                self.stop_monitor();
                None
            }

            UpdateAction::SaveRecords { path, records } => {
                let tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    let target = path.clone();
                    let error = match tokio::task::spawn_blocking(move || {
                        records_io::save_records(&target, &records)
                            .with_context(|| format!("Saving records to {:?}", target))
                    })
                    .await
                    {
                        Ok(Ok(())) => None,
                        Ok(Err(e)) => Some(e.to_string()),
                        Err(e) => Some(e.to_string()),
                    };
                    let _ = tx.send(Message::RecordsSaved { path, error }).await;
                });
                None
            }

            UpdateAction::LoadRecords { path } => {
                let tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    let source = path.clone();
                    let result = match tokio::task::spawn_blocking(move || {
                        records_io::load_records(&source)
                            .with_context(|| format!("Loading records from {:?}", source))
                    })
                    .await
                    {
                        Ok(result) => result.map_err(|e| e.to_string()),
                        Err(e) => Err(e.to_string()),
                    };
                    let _ = tx.send(Message::RecordsLoaded { path, result }).await;
                });
                None
            }
        }
    }

    fn spawn_monitor(msg_tx: mpsc::Sender<Message>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + MONITOR_PERIOD, MONITOR_PERIOD);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if msg_tx.send(Message::BenchmarkTick).await.is_err() {
                    break;
                }
            }
        })
    }

    fn stop_monitor(&mut self) {
        if let Some(monitor) = self.monitor.take() {
            monitor.abort();
        }
    }

    /// Stop the server, wait for its connections, and close every tab.
    ///
    /// Waiting is bounded by the configured shutdown timeout. A `Quit` message
    /// arriving meanwhile abandons the wait.
    pub async fn shutdown(&mut self) {
        self.emit(EngineEvent::Shutdown);
        self.stop_monitor();

        let closing = match self.server.take() {
            Some(handle) => Some(tokio::spawn(handle.close())),
            None => self.stopping.take(),
        };

        if let Some(mut closing) = closing {
            let limit = Duration::from_millis(self.state.settings.server.shutdown_timeout_ms)
                + FINISH_GRACE * 2;
            let deadline = tokio::time::sleep(limit);
            tokio::pin!(deadline);

            loop {
                tokio::select! {
                    joined = &mut closing => {
                        match joined {
                            Ok(report) if report.is_clean() => info!("Server closed cleanly"),
                            Ok(report) => warn!("{} connections were aborted", report.aborted.len()),
                            Err(e) => warn!("Server close task failed: {}", e),
                        }
                        break;
                    }
                    msg = self.msg_rx.recv() => {
                        // Keep draining so the event bridge never blocks the close
                        if matches!(msg, Some(Message::Quit)) {
                            warn!("Forced quit, not waiting for connections");
                            closing.abort();
                            break;
                        }
                    }
                    _ = &mut deadline => {
                        warn!("Server close timed out");
                        closing.abort();
                        break;
                    }
                }
            }
        }

        for tab in self.state.tabs.close_all() {
            debug!("Closed tab \"{}\"", tab);
        }
        self.bridge.abort();
    }

    /// Broadcast everything the last update produced
    fn flush_events(&mut self) {
        for event in self.state.take_events() {
            self.emit(event);
        }
    }

    /// Emit a single EngineEvent to all subscribers.
    ///
    /// send() only fails when there are no subscribers, which is fine.
    fn emit(&self, event: EngineEvent) {
        let _ = self.event_tx.send(event);
    }
}
