use std::io::Write;

use crate::channel::StreamKind;
use crate::codec::{Frame, FrameConfig, Header};
use crate::error::{FrameError, Result};

/// Produces a multiplexed log stream, the way the daemon does for a
/// non-TTY container. Mostly useful for fixtures and the `frame` command.
#[derive(Debug)]
pub struct FrameWriter<T> {
    inner: T,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.send(frame.stream, &frame.payload)
    }

    /// Write one header and its payload. Payloads above the configured cap
    /// are rejected before anything is written.
    pub fn send(&mut self, stream: StreamKind, payload: &[u8]) -> Result<()> {
        let max = self.config.max_payload_size;
        let len = u32::try_from(payload.len())
            .ok()
            .filter(|len| *len as usize <= max)
            .ok_or(FrameError::PayloadTooLarge {
                size: payload.len(),
                max,
            })?;

        self.inner.write_all(&Header { stream, len }.to_bytes())?;
        self.inner.write_all(payload)?;
        Ok(())
    }

    /// Send `data` as consecutive frames of at most the configured payload
    /// size, then flush. Returns the number of frames written.
    pub fn send_chunked(&mut self, stream: StreamKind, data: &[u8]) -> Result<usize> {
        let frames = data
            .chunks(self.config.max_payload_size.max(1))
            .try_fold(0usize, |n, chunk| self.send(stream, chunk).map(|()| n + 1))?;
        self.flush()?;
        Ok(frames)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush().map_err(FrameError::Io)
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}
