//! Record sources and their shared emission contract

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::timeout;

use cutelog_core::prelude::*;
use cutelog_core::LogRecord;

use crate::event::{ConnectionControl, ConnectionId, ServerEvent};

/// How often blocked reads and sends wake up to re-check cancellation
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long a finishing source may wait for room to report completion
pub const FINISH_GRACE: Duration = Duration::from_millis(500);

/// A producer of log records for one connection.
///
/// Implementations only emit through the [`RecordSink`]; they never touch tab
/// state. Use [`drive`] to run a source so completion is always reported.
#[trait_variant::make(RecordSource: Send)]
pub trait LocalRecordSource {
    /// Produce records until exhausted or until `sink.need_to_stop()`.
    async fn run(self, sink: &RecordSink);
}

/// Run a source to completion, then report `ConnectionFinished` exactly once.
pub async fn drive<S: RecordSource>(source: S, sink: RecordSink) {
    source.run(&sink).await;
    sink.finish().await;
}

/// The emission side of a connection: record hand-off plus cancellation state.
#[derive(Debug)]
pub struct RecordSink {
    conn_id: ConnectionId,
    control: ConnectionControl,
    shutdown: watch::Receiver<bool>,
    events: mpsc::Sender<ServerEvent>,
}

impl RecordSink {
    /// `shutdown` is the server generation's token; `control` is this connection's flags.
    pub fn new(
        conn_id: ConnectionId,
        control: ConnectionControl,
        shutdown: watch::Receiver<bool>,
        events: mpsc::Sender<ServerEvent>,
    ) -> Self {
        Self {
            conn_id,
            control,
            shutdown,
            events,
        }
    }

    pub fn conn_id(&self) -> ConnectionId {
        self.conn_id
    }

    /// Stop requested, tab closed, or the server generation is shutting down
    pub fn need_to_stop(&self) -> bool {
        self.control.need_to_stop() || *self.shutdown.borrow()
    }

    /// Hand a record to the controller.
    ///
    /// Waits for channel capacity in [`POLL_INTERVAL`] slices so a stop request
    /// is noticed even while the controller is busy. Returns false if the record
    /// was not delivered and the source should stop.
    pub async fn emit(&self, record: LogRecord) -> bool {
        loop {
            if self.need_to_stop() {
                return false;
            }
            match timeout(POLL_INTERVAL, self.events.reserve()).await {
                Ok(Ok(permit)) => {
                    permit.send(ServerEvent::Record {
                        conn_id: self.conn_id,
                        record,
                    });
                    return true;
                }
                Ok(Err(_)) => {
                    debug!("Connection id={}: event channel closed", self.conn_id);
                    return false;
                }
                Err(_) => continue,
            }
        }
    }

    /// Report completion. Consumes the sink so it can only happen once.
    pub async fn finish(self) {
        let event = ServerEvent::ConnectionFinished {
            conn_id: self.conn_id,
        };
        match timeout(FINISH_GRACE, self.events.send(event)).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => debug!("Connection id={}: event channel closed", self.conn_id),
            Err(_) => warn!(
                "Connection id={} could not report completion in time",
                self.conn_id
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutelog_core::Fields;

    fn sink() -> (RecordSink, mpsc::Receiver<ServerEvent>, watch::Sender<bool>, ConnectionControl) {
        let (tx, rx) = mpsc::channel(4);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let control = ConnectionControl::new();
        (RecordSink::new(7, control.clone(), shutdown_rx, tx), rx, shutdown_tx, control)
    }

    struct Fixed(Vec<LogRecord>);

    impl RecordSource for Fixed {
        async fn run(self, sink: &RecordSink) {
            for record in self.0 {
                if !sink.emit(record).await {
                    break;
                }
            }
        }
    }

    #[tokio::test]
    async fn test_drive_emits_then_finishes_once() {
        let (sink, mut rx, _shutdown, _control) = sink();
        let records = vec![
            LogRecord::from_fields(Fields::new()),
            LogRecord::from_fields(Fields::new()),
        ];
        drive(Fixed(records), sink).await;

        assert!(matches!(rx.recv().await, Some(ServerEvent::Record { conn_id: 7, .. })));
        assert!(matches!(rx.recv().await, Some(ServerEvent::Record { conn_id: 7, .. })));
        assert!(matches!(
            rx.recv().await,
            Some(ServerEvent::ConnectionFinished { conn_id: 7 })
        ));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_emit_refuses_after_tab_closed() {
        let (sink, mut rx, _shutdown, control) = sink();
        control.close_tab();
        assert!(!sink.emit(LogRecord::from_fields(Fields::new())).await);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_shutdown_token_stops_sink() {
        let (sink, _rx, shutdown, _control) = sink();
        assert!(!sink.need_to_stop());
        shutdown.send(true).unwrap();
        assert!(sink.need_to_stop());
    }

    #[tokio::test]
    async fn test_emit_on_full_channel_notices_stop() {
        let (tx, _rx) = mpsc::channel(1);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let control = ConnectionControl::new();
        let sink = RecordSink::new(1, control.clone(), shutdown_rx, tx);

        assert!(sink.emit(LogRecord::from_fields(Fields::new())).await);
        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            control.request_stop();
        });
        assert!(!sink.emit(LogRecord::from_fields(Fields::new())).await);
        stopper.await.unwrap();
    }
}
