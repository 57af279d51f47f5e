//! Headless mode runner - main event loop without widgets
//!
//! Owns the Engine, feeds it stdin commands, and prints its events as NDJSON.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use cutelog_app::{Engine, EngineEvent, Message, Settings};
use cutelog_core::prelude::*;

use super::commands::parse_command;
use super::HeadlessEvent;

/// How long to wait for the last events to be printed after shutdown
const EMITTER_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Run in headless mode: start the server, load `record_files` into tabs, and
/// process messages until quit.
pub async fn run_headless(
    settings: Settings,
    config_dir: Option<PathBuf>,
    record_files: Vec<PathBuf>,
) -> Result<()> {
    info!("═══════════════════════════════════════════════════════");
    info!("cutelog starting in HEADLESS mode");
    info!(
        "Listening address: {}:{}",
        settings.server.listen_host, settings.server.listen_port
    );
    info!("═══════════════════════════════════════════════════════");

    let mut engine = Engine::new(settings, config_dir);

    let emitter = spawn_event_emitter(engine.subscribe());

    let stdin_tx = engine.msg_sender();
    std::thread::spawn(move || {
        spawn_stdin_reader_blocking(stdin_tx);
    });

    engine.process_message(Message::StartServer).await;
    for path in record_files {
        engine.process_message(Message::LoadRecords(path)).await;
    }

    let result = headless_event_loop(&mut engine).await;

    engine.shutdown().await;
    drop(engine);

    if tokio::time::timeout(EMITTER_DRAIN_TIMEOUT, emitter)
        .await
        .is_err()
    {
        warn!("Event emitter did not finish in time");
    }

    info!("cutelog headless mode exiting");
    result
}

/// Main headless event loop
async fn headless_event_loop(engine: &mut Engine) -> Result<()> {
    loop {
        if engine.should_quit() {
            info!("Quit requested");
            break;
        }

        match engine.msg_rx.recv().await {
            Some(msg) => engine.process_message(msg).await,
            None => {
                info!("Message channel closed");
                break;
            }
        }
    }

    Ok(())
}

/// Print every engine event to stdout until the engine shuts down
fn spawn_event_emitter(mut events: broadcast::Receiver<EngineEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    HeadlessEvent::from(&event).emit();
                    if matches!(event, EngineEvent::Shutdown) {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Event output fell behind, {} events dropped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// Read commands from stdin and send them to the message channel (blocking)
fn spawn_stdin_reader_blocking(msg_tx: mpsc::Sender<Message>) {
    use std::io::BufRead;

    let stdin = std::io::stdin();
    let reader = stdin.lock();

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        };

        let msg = match parse_command(&line) {
            Ok(Some(msg)) => msg,
            Ok(None) => continue,
            Err(e) => {
                warn!("Bad stdin command {:?}: {}", line.trim(), e);
                Message::InvalidCommand(e)
            }
        };

        if msg_tx.blocking_send(msg).is_err() {
            break;
        }
    }

    info!("Stdin reader exiting");
}
