//! OS signal handling for graceful shutdown

use tokio::sync::mpsc;

use cutelog_core::prelude::*;

use crate::message::Message;

/// Spawn a task that turns termination signals into quit messages.
///
/// The first signal starts a graceful shutdown; a second one while it is in
/// progress forces the exit.
pub fn spawn_signal_handler(tx: mpsc::Sender<Message>) {
    tokio::spawn(async move {
        loop {
            if let Err(e) = wait_for_signal().await {
                error!("Signal handler error: {}", e);
                return;
            }

            info!("Shutdown signal received");
            if tx.send(Message::Quit).await.is_err() {
                return;
            }
        }
    });
}

/// Wait for a termination signal
async fn wait_for_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
        }

        Ok(())
    }

    #[cfg(windows)]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signal_handler_spawn() {
        let (tx, mut rx) = mpsc::channel::<Message>(1);

        spawn_signal_handler(tx);
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

        // No signal sent yet
        assert!(rx.try_recv().is_err());
    }
}
