//! Length-prefixed framing
//!
//! ```text
//! Frame := LENGTH (4 bytes, big-endian u32) PAYLOAD (LENGTH bytes)
//! ```

use cutelog_core::prelude::*;

/// Size of the big-endian length prefix
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Largest payload a client may declare before its frame is dropped
pub const DEFAULT_MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Prefix `payload` with its length
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>> {
    let len = u32::try_from(payload.len())
        .map_err(|_| Error::frame_too_large(payload.len(), u32::MAX as usize))?;
    let mut frame = Vec::with_capacity(LENGTH_PREFIX_LEN + payload.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Incremental frame splitter.
///
/// Bytes are pushed as they arrive from the socket, in chunks of any size;
/// complete payloads are pulled out with [`FrameDecoder::next_frame`].
/// A frame declaring more than `max_frame_len` bytes is never buffered: its
/// payload is discarded as it arrives and the stream resumes at the next prefix.
#[derive(Debug)]
pub struct FrameDecoder {
    buf: Vec<u8>,
    consumed: usize,
    max_frame_len: usize,
    /// Payload bytes of an oversized frame still to discard
    skipping: usize,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::with_max_frame_len(DEFAULT_MAX_FRAME_LEN)
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_frame_len(max_frame_len: usize) -> Self {
        Self {
            buf: Vec::new(),
            consumed: 0,
            max_frame_len,
            skipping: 0,
        }
    }

    /// Append freshly read bytes
    pub fn push(&mut self, bytes: &[u8]) {
        if self.consumed > 0 {
            self.buf.drain(..self.consumed);
            self.consumed = 0;
        }
        let skipped = self.skipping.min(bytes.len());
        self.skipping -= skipped;
        self.buf.extend_from_slice(&bytes[skipped..]);
    }

    /// Next complete payload, if one is fully buffered.
    ///
    /// A zero-length frame yields an empty payload. An oversized frame yields
    /// [`Error::FrameTooLarge`] once, as soon as its prefix is read.
    pub fn next_frame(&mut self) -> Option<Result<Vec<u8>>> {
        let pending = &self.buf[self.consumed..];
        let prefix: [u8; LENGTH_PREFIX_LEN] = pending.get(..LENGTH_PREFIX_LEN)?.try_into().ok()?;
        let len = u32::from_be_bytes(prefix) as usize;

        if len > self.max_frame_len {
            let buffered = (pending.len() - LENGTH_PREFIX_LEN).min(len);
            self.consumed += LENGTH_PREFIX_LEN + buffered;
            self.skipping = len - buffered;
            return Some(Err(Error::frame_too_large(len, self.max_frame_len)));
        }

        let payload = pending.get(LENGTH_PREFIX_LEN..LENGTH_PREFIX_LEN + len)?.to_vec();
        self.consumed += LENGTH_PREFIX_LEN + len;
        Some(Ok(payload))
    }

    /// Bytes received but not yet returned as a frame
    pub fn buffered(&self) -> usize {
        self.buf.len() - self.consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_frame_prefix() {
        let frame = encode_frame(b"abc").unwrap();
        assert_eq!(frame, vec![0, 0, 0, 3, b'a', b'b', b'c']);
    }

    #[test]
    fn test_decoder_whole_frames() {
        let mut decoder = FrameDecoder::new();
        let mut stream = encode_frame(b"first").unwrap();
        stream.extend(encode_frame(b"second").unwrap());
        decoder.push(&stream);

        assert_eq!(decoder.next_frame().unwrap().unwrap(), b"first");
        assert_eq!(decoder.next_frame().unwrap().unwrap(), b"second");
        assert!(decoder.next_frame().is_none());
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_decoder_byte_by_byte() {
        let payload: Vec<u8> = (0..=255).collect();
        let stream = encode_frame(&payload).unwrap();
        let mut decoder = FrameDecoder::new();

        for (i, byte) in stream.iter().enumerate() {
            decoder.push(std::slice::from_ref(byte));
            if i + 1 < stream.len() {
                assert!(decoder.next_frame().is_none());
            }
        }
        assert_eq!(decoder.next_frame().unwrap().unwrap(), payload);
    }

    #[test]
    fn test_decoder_zero_length_frame() {
        let mut decoder = FrameDecoder::new();
        decoder.push(&[0, 0, 0, 0]);
        assert!(decoder.next_frame().unwrap().unwrap().is_empty());
    }

    #[test]
    fn test_decoder_partial_prefix() {
        let mut decoder = FrameDecoder::new();
        decoder.push(&[0, 0]);
        assert!(decoder.next_frame().is_none());
        decoder.push(&[0, 1, b'x']);
        assert_eq!(decoder.next_frame().unwrap().unwrap(), vec![b'x']);
    }

    #[test]
    fn test_oversized_frame_is_skipped() {
        let mut decoder = FrameDecoder::with_max_frame_len(8);
        let mut stream = encode_frame(&[7u8; 20]).unwrap();
        stream.extend(encode_frame(b"ok").unwrap());

        // Prefix and part of the oversized payload first
        decoder.push(&stream[..10]);
        let err = decoder.next_frame().unwrap().unwrap_err();
        assert!(matches!(err, Error::FrameTooLarge { size: 20, limit: 8 }));
        assert!(decoder.next_frame().is_none());
        assert_eq!(decoder.buffered(), 0);

        decoder.push(&stream[10..]);
        assert_eq!(decoder.next_frame().unwrap().unwrap(), b"ok");
        assert!(decoder.next_frame().is_none());
    }

    #[test]
    fn test_oversized_frame_fully_buffered() {
        let mut decoder = FrameDecoder::with_max_frame_len(4);
        let mut stream = encode_frame(b"too long").unwrap();
        stream.extend(encode_frame(b"next").unwrap());
        decoder.push(&stream);

        assert!(decoder.next_frame().unwrap().is_err());
        assert_eq!(decoder.next_frame().unwrap().unwrap(), b"next");
    }
}
