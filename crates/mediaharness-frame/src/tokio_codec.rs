//! `tokio_util` codec for the log stream format.
//!
//! Lets async callers wrap an attach or log stream in `FramedRead` and get
//! one [`Frame`] per chunk the container wrote.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_frame, encode_frame, Frame, DEFAULT_MAX_PAYLOAD};
use crate::error::FrameError;

/// Strict decoder/encoder for multiplexed log frames.
#[derive(Debug, Clone)]
pub struct LogCodec {
    max_payload_size: usize,
}

impl LogCodec {
    /// Codec with the default 16 MiB payload cap.
    pub fn new() -> Self {
        Self::with_max_payload(DEFAULT_MAX_PAYLOAD)
    }

    /// Codec with an explicit payload cap.
    pub fn with_max_payload(max_payload_size: usize) -> Self {
        Self { max_payload_size }
    }
}

impl Default for LogCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LogCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        decode_frame(src, self.max_payload_size)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => Err(FrameError::Truncated {
                buffered: src.len(),
            }),
        }
    }
}

impl Encoder<Frame> for LogCodec {
    type Error = FrameError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), FrameError> {
        if frame.payload.len() > self.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: frame.payload.len(),
                max: self.max_payload_size,
            });
        }
        encode_frame(frame.stream, &frame.payload, dst)
    }
}
