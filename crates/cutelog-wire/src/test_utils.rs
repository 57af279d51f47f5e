//! Test utilities for wire frames
//!
//! Provides helper functions for building the byte streams a logging client
//! would send.

use serde_json::Value;

use crate::control::{encode_control, ControlCommand};
use crate::format::SerializationFormat;
use crate::frame::encode_frame;

/// Encodes a mapping as a length-prefixed pickle frame.
///
/// # Panics
/// If `value` cannot be pickled (test helper only).
pub fn pickle_frame(value: &Value) -> Vec<u8> {
    let payload = serde_pickle::to_vec(value, serde_pickle::SerOptions::new())
        .expect("value should be picklable");
    encode_frame(&payload).expect("payload should fit in a frame")
}

/// Encodes a mapping as a length-prefixed JSON frame.
pub fn json_frame(value: &Value) -> Vec<u8> {
    let payload = serde_json::to_vec(value).expect("value should serialize");
    encode_frame(&payload).expect("payload should fit in a frame")
}

/// Builds the frame that switches a connection to `format`.
pub fn format_switch_frame(format: SerializationFormat) -> Vec<u8> {
    let payload = encode_control(&ControlCommand::Format(format));
    encode_frame(&payload).expect("control payload should fit in a frame")
}

/// Builds a zero-length keep-alive frame.
pub fn empty_frame() -> Vec<u8> {
    vec![0; crate::frame::LENGTH_PREFIX_LEN]
}
