use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::channel::{is_stream_tag, StreamKind};
use crate::error::{FrameError, Result};

/// Frame header: tag (1) + padding (3) + length (4) = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// Default maximum payload size: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// A decoded stream header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// The stream the following payload belongs to.
    pub stream: StreamKind,
    /// Declared payload length in bytes.
    pub len: u32,
}

impl Header {
    /// Parse a header from the start of `src`.
    ///
    /// Returns `None` if fewer than [`HEADER_SIZE`] bytes are available, the
    /// tag is unknown, or the padding is not zero.
    pub fn parse(src: &[u8]) -> Option<Self> {
        if !Self::matches(src) {
            return None;
        }
        let stream = StreamKind::from_tag(src[0])?;
        let len = u32::from_be_bytes([src[4], src[5], src[6], src[7]]);
        Some(Self { stream, len })
    }

    /// Returns true if `src` starts with something shaped like a header:
    /// a known tag followed by three zero bytes, with a full length field
    /// after it. The length value itself is not inspected.
    pub fn matches(src: &[u8]) -> bool {
        src.len() >= HEADER_SIZE && is_stream_tag(src[0]) && src[1..4] == [0, 0, 0]
    }

    /// Serialize the header into its wire form.
    pub fn to_bytes(self) -> [u8; HEADER_SIZE] {
        let len = self.len.to_be_bytes();
        [self.stream.tag(), 0, 0, 0, len[0], len[1], len[2], len[3]]
    }
}

/// One chunk of output from a single stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The stream this chunk was written to.
    pub stream: StreamKind,
    /// The chunk bytes.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(stream: StreamKind, payload: impl Into<Bytes>) -> Self {
        Self {
            stream,
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Append `stream`'s header and `payload` to `dst`.
///
/// ```text
/// [tag] [00 00 00] [len: u32 BE] [payload; len]
/// ```
pub fn encode_frame(stream: StreamKind, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let len = u32::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge {
        size: payload.len(),
        max: u32::MAX as usize,
    })?;
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_slice(&Header { stream, len }.to_bytes());
    dst.put_slice(payload);
    Ok(())
}

/// Take one complete frame off the front of `src`.
///
/// `Ok(None)` leaves `src` untouched and means more bytes are needed. A
/// header that fails to parse or declares more than `max_payload` bytes is an
/// error as soon as its 8 bytes are buffered.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Frame>> {
    let Some(head) = src.get(..HEADER_SIZE) else {
        return Ok(None);
    };
    let header = Header::parse(head).ok_or(FrameError::InvalidHeader {
        tag: head[0],
        padding: [head[1], head[2], head[3]],
    })?;

    let len = header.len as usize;
    if len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: len,
            max: max_payload,
        });
    }

    let missing = (HEADER_SIZE + len).saturating_sub(src.len());
    if missing > 0 {
        src.reserve(missing);
        return Ok(None);
    }

    let mut frame = src.split_to(HEADER_SIZE + len);
    frame.advance(HEADER_SIZE);
    Ok(Some(Frame::new(header.stream, frame.freeze())))
}

/// Limits applied by the strict reader, writer and codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Largest payload accepted or produced. Default: 16 MiB.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}
