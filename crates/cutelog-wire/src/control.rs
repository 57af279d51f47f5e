//! In-band control frames
//!
//! Clients that cannot speak pickle announce their format with a control frame:
//! the payload `!!cutelog!!format=json` switches every following frame on that
//! connection to JSON.

use cutelog_core::prelude::*;

use crate::format::SerializationFormat;

/// Sentinel that marks a payload as a control frame
pub const CONTROL_PREFIX: &[u8] = b"!!cutelog!!";

/// A parsed control command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    /// Switch the connection's serialization format
    Format(SerializationFormat),
}

/// Whether a payload is a control frame rather than a record
pub fn is_control_frame(payload: &[u8]) -> bool {
    payload.starts_with(CONTROL_PREFIX)
}

/// Parse the `key=value` command carried by a control frame.
///
/// Fails for bad UTF-8, a missing `=`, an unknown key, or a format this build
/// cannot decode.
pub fn parse_control(payload: &[u8]) -> Result<ControlCommand> {
    let body = payload.strip_prefix(CONTROL_PREFIX).unwrap_or(payload);
    let text = std::str::from_utf8(body)
        .map_err(|e| Error::control(format!("Internal request decoding failed: {}", e)))?;
    let (key, value) = text
        .split_once('=')
        .ok_or_else(|| Error::control(format!("Malformed command \"{}\"", text)))?;

    debug!("Handling internal cmd=\"{}\", value=\"{}\"", key, value);
    match key {
        "format" => {
            let format: SerializationFormat = value.parse()?;
            if !format.is_available() {
                return Err(Error::unsupported_format(value));
            }
            Ok(ControlCommand::Format(format))
        }
        other => Err(Error::control(format!("No such command \"{}\"", other))),
    }
}

/// Build the payload of a control frame (without the length prefix)
pub fn encode_control(command: &ControlCommand) -> Vec<u8> {
    let body = match command {
        ControlCommand::Format(format) => format!("format={}", format),
    };
    let mut payload = CONTROL_PREFIX.to_vec();
    payload.extend_from_slice(body.as_bytes());
    payload
}
