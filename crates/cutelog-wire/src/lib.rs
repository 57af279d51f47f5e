//! # cutelog-wire - Log Record Ingestion
//!
//! Receives log records over TCP: length-prefixed framing, payload
//! deserialization with in-band format switching, one task per connection, and
//! the listening server that owns them.
//!
//! Depends on [`cutelog_core`] for the record model and error handling.
//!
//! ## Public API
//!
//! ### Protocol
//! - [`encode_frame()`], [`FrameDecoder`] - 4-byte big-endian length framing
//! - [`SerializationFormat`] - pickle / json / msgpack / cbor payload decoding
//! - [`ControlCommand`], [`parse_control()`] - `!!cutelog!!key=value` control frames
//! - [`RecordCodec`] - Per-connection decoder holding the active format
//!
//! ### Sources
//! - [`RecordSource`] - A producer of records for one connection
//! - [`RecordSink`] - Emission side shared by all sources, with cancellation
//! - [`SocketRecordSource`] - Reads frames from a client socket
//! - [`SyntheticBenchmarkSource`] - Generates records at a fixed interval
//!
//! ### Server
//! - [`LogServer`], [`ServerHandle`] - Listener lifecycle and connection registry
//! - [`ServerEvent`] - Connection opened / record / connection finished
//! - [`ConnectionControl`] - Stop and tab-closed flags shared with a connection

pub mod benchmark;
pub mod codec;
pub mod connection;
pub mod control;
pub mod event;
pub mod format;
pub mod frame;
pub mod server;
pub mod source;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

pub use benchmark::{SyntheticBenchmarkSource, BENCHMARK_CONN_ID};
pub use codec::{Decoded, RecordCodec};
pub use connection::{ConnectionState, SocketRecordSource};
pub use control::{encode_control, is_control_frame, parse_control, ControlCommand, CONTROL_PREFIX};
pub use event::{
    ConnectionControl, ConnectionId, ConnectionInfo, ServerEvent, ShutdownReport, SourceKind,
};
pub use format::SerializationFormat;
pub use frame::{encode_frame, FrameDecoder, DEFAULT_MAX_FRAME_LEN, LENGTH_PREFIX_LEN};
pub use server::{LogServer, ServerConfig, ServerHandle, DEFAULT_PORT};
pub use source::{
    drive, LocalRecordSource, RecordSink, RecordSource, FINISH_GRACE, POLL_INTERVAL,
};
