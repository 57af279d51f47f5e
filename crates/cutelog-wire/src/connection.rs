//! Socket-backed record source (one per TCP client)

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use cutelog_core::prelude::*;

use crate::codec::{Decoded, RecordCodec};
use crate::control::is_control_frame;
use crate::format::SerializationFormat;
use crate::frame::FrameDecoder;
use crate::source::{RecordSink, RecordSource, POLL_INTERVAL};

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Lifecycle of a socket connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Reading,
    Stopping,
    Closed,
}

/// Reads frames from a client socket and emits the records they carry.
///
/// Reads wait at most [`POLL_INTERVAL`] at a time so cancellation is observed
/// promptly. A frame that fails to decode is logged and skipped; only peer
/// disconnect or cancellation end the loop.
pub struct SocketRecordSource<S> {
    stream: S,
    codec: RecordCodec,
    decoder: FrameDecoder,
    state: ConnectionState,
}

impl<S> SocketRecordSource<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S, format: SerializationFormat) -> Self {
        Self {
            stream,
            codec: RecordCodec::new(format),
            decoder: FrameDecoder::new(),
            state: ConnectionState::Connecting,
        }
    }

    /// Drop frames declaring more than `max` payload bytes
    /// (default [`DEFAULT_MAX_FRAME_LEN`](crate::frame::DEFAULT_MAX_FRAME_LEN))
    pub fn with_max_frame_len(mut self, max: usize) -> Self {
        self.decoder = FrameDecoder::with_max_frame_len(max);
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    fn transition(&mut self, conn_id: u64, next: ConnectionState) {
        trace!("Connection id={}: {:?} -> {:?}", conn_id, self.state, next);
        self.state = next;
    }

    async fn read_loop(&mut self, sink: &RecordSink) {
        let conn_id = sink.conn_id();
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];

        loop {
            if sink.need_to_stop() {
                debug!("Connection id={}: stop requested", conn_id);
                return;
            }

            let n = match timeout(POLL_INTERVAL, self.stream.read(&mut chunk)).await {
                Err(_) => continue,
                Ok(Ok(0)) => {
                    debug!("Connection id={}: peer closed the connection", conn_id);
                    return;
                }
                Ok(Ok(n)) => n,
                Ok(Err(e)) => {
                    debug!("Connection id={}: read failed: {}", conn_id, e);
                    return;
                }
            };

            self.decoder.push(&chunk[..n]);
            while let Some(frame) = self.decoder.next_frame() {
                let payload = match frame {
                    Ok(payload) if payload.is_empty() => continue,
                    Ok(payload) => payload,
                    Err(e) => {
                        error!("Connection id={}: dropping frame: {}", conn_id, e);
                        continue;
                    }
                };
                if !self.handle_payload(&payload, sink).await {
                    return;
                }
            }
        }
    }

    /// Returns false when the record could not be handed off and reading should stop.
    async fn handle_payload(&mut self, payload: &[u8], sink: &RecordSink) -> bool {
        match self.codec.decode(payload) {
            Ok(Decoded::Record(record)) => sink.emit(record).await,
            Ok(Decoded::Control(_)) => true,
            Err(e) if is_control_frame(payload) => {
                error!("Connection id={}: control command failed: {}", sink.conn_id(), e);
                true
            }
            Err(e) => {
                error!("Connection id={}: creating log record failed: {}", sink.conn_id(), e);
                true
            }
        }
    }
}

impl<S> RecordSource for SocketRecordSource<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn run(mut self, sink: &RecordSink) {
        let conn_id = sink.conn_id();
        debug!("Connection id={} is starting", conn_id);

        self.transition(conn_id, ConnectionState::Reading);
        self.read_loop(sink).await;

        self.transition(conn_id, ConnectionState::Stopping);
        debug!("Connection id={} is stopping", conn_id);
        match timeout(POLL_INTERVAL, self.stream.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => trace!("Connection id={}: shutdown: {}", conn_id, e),
            Err(_) => trace!("Connection id={}: shutdown timed out", conn_id),
        }

        self.transition(conn_id, ConnectionState::Closed);
        debug!("Connection id={} has stopped", conn_id);
    }
}
