//! Per-connection payload decoder

use cutelog_core::prelude::*;
use cutelog_core::LogRecord;

use crate::control::{is_control_frame, parse_control, ControlCommand};
use crate::format::SerializationFormat;

/// Result of decoding one frame payload
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A log record to forward to the owning tab
    Record(LogRecord),
    /// A control command that has already been applied to the codec
    Control(ControlCommand),
}

/// Turns frame payloads into records.
///
/// Holds the connection's active serialization format, which control frames
/// may switch at any point in the stream.
#[derive(Debug, Clone)]
pub struct RecordCodec {
    format: SerializationFormat,
}

impl RecordCodec {
    pub fn new(format: SerializationFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> SerializationFormat {
        self.format
    }

    /// Decode one payload.
    ///
    /// On error the codec state is unchanged, so the caller can log and move on
    /// to the next frame.
    pub fn decode(&mut self, payload: &[u8]) -> Result<Decoded> {
        if is_control_frame(payload) {
            let command = parse_control(payload)?;
            self.apply(&command);
            return Ok(Decoded::Control(command));
        }

        let fields = self.format.deserialize(payload)?;
        Ok(Decoded::Record(LogRecord::from_fields(fields)))
    }

    fn apply(&mut self, command: &ControlCommand) {
        match command {
            ControlCommand::Format(format) => {
                debug!("Changing serialization format to \"{}\"", format);
                self.format = *format;
            }
        }
    }
}

impl Default for RecordCodec {
    fn default() -> Self {
        Self::new(SerializationFormat::default())
    }
}
