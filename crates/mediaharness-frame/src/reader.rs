use std::io::{ErrorKind, Read, Write};
use std::iter::FusedIterator;

use bytes::Bytes;

use crate::channel::StreamKind;
use crate::codec::{Frame, FrameConfig, Header, HEADER_SIZE};
use crate::error::{FrameError, Result};

/// Strict, blocking reader for a live log stream.
///
/// Each call reads exactly one header and then exactly its payload, so the
/// reader never consumes bytes past the frame it returns. Unlike
/// [`crate::unframe`], malformed input is an error.
///
/// As an iterator it yields at most one error and then ends, since the
/// stream position after a bad frame is unknown.
#[derive(Debug)]
pub struct FrameReader<T> {
    inner: T,
    config: FrameConfig,
    failed: bool,
}

/// Byte counts per stream from [`FrameReader::split_into`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitStats {
    pub frames: usize,
    pub stdout_bytes: u64,
    pub stderr_bytes: u64,
}

impl<T: Read> FrameReader<T> {
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            config,
            failed: false,
        }
    }

    /// Next frame, `Ok(None)` at a clean end of stream.
    ///
    /// End of stream inside a header or payload is [`FrameError::Truncated`].
    pub fn read_frame(&mut self) -> Result<Option<Frame>> {
        let mut head = [0u8; HEADER_SIZE];
        let got = fill(&mut self.inner, &mut head)?;
        if got == 0 {
            return Ok(None);
        }
        if got < HEADER_SIZE {
            return Err(FrameError::Truncated { buffered: got });
        }

        let header = Header::parse(&head).ok_or(FrameError::InvalidHeader {
            tag: head[0],
            padding: [head[1], head[2], head[3]],
        })?;
        let len = header.len as usize;
        if len > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: len,
                max: self.config.max_payload_size,
            });
        }

        let mut payload = vec![0u8; len];
        let got = fill(&mut self.inner, &mut payload)?;
        if got < len {
            return Err(FrameError::Truncated {
                buffered: HEADER_SIZE + got,
            });
        }
        Ok(Some(Frame::new(header.stream, Bytes::from(payload))))
    }

    /// Copy every payload to `stdout` or `stderr` by stream until the input
    /// ends. Stdin echoes go to `stdout`.
    pub fn split_into<O: Write, E: Write>(
        &mut self,
        stdout: &mut O,
        stderr: &mut E,
    ) -> Result<SplitStats> {
        let mut stats = SplitStats::default();
        while let Some(frame) = self.read_frame()? {
            stats.frames += 1;
            let len = frame.payload.len() as u64;
            match frame.stream {
                StreamKind::Stderr => {
                    stderr.write_all(&frame.payload)?;
                    stats.stderr_bytes += len;
                }
                StreamKind::Stdout | StreamKind::Stdin => {
                    stdout.write_all(&frame.payload)?;
                    stats.stdout_bytes += len;
                }
            }
        }
        stdout.flush()?;
        stderr.flush()?;
        Ok(stats)
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read> Iterator for FrameReader<T> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.read_frame().transpose();
        self.failed = matches!(item, Some(Err(_)));
        item
    }
}

impl<T: Read> FusedIterator for FrameReader<T> {}

/// Read until `buf` is full or the input ends; returns the bytes read.
fn fill<R: Read>(input: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn wire(frames: &[(u8, &[u8])]) -> Vec<u8> {
        let mut out = Vec::new();
        for (tag, payload) in frames {
            out.extend_from_slice(&[*tag, 0, 0, 0]);
            out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
            out.extend_from_slice(payload);
        }
        out
    }

    /// Hands out at most `step` bytes per read and fails once with `fail`
    /// before the first byte.
    struct Trickle {
        data: Cursor<Vec<u8>>,
        step: usize,
        fail: Option<ErrorKind>,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if let Some(kind) = self.fail.take() {
                return Err(kind.into());
            }
            let n = buf.len().min(self.step);
            self.data.read(&mut buf[..n])
        }
    }

    #[test]
    fn ffmpeg_style_interleaving() {
        let raw = wire(&[
            (2, b"ffmpeg version 8.0\n"),
            (1, b"{\"streams\":[]}"),
            (2, b"frame=  240 fps=0.0\n"),
        ]);
        let frames: Vec<Frame> = FrameReader::new(Cursor::new(raw))
            .collect::<Result<_>>()
            .unwrap();

        let streams: Vec<StreamKind> = frames.iter().map(|f| f.stream).collect();
        assert_eq!(
            streams,
            vec![StreamKind::Stderr, StreamKind::Stdout, StreamKind::Stderr]
        );
        assert_eq!(frames[1].payload.as_ref(), b"{\"streams\":[]}");
    }

    #[test]
    fn one_byte_reads_and_interrupts() {
        let raw = wire(&[(1, b"slow"), (2, b"")]);
        let mut reader = FrameReader::new(Trickle {
            data: Cursor::new(raw),
            step: 1,
            fail: Some(ErrorKind::Interrupted),
        });

        assert_eq!(reader.read_frame().unwrap().unwrap().payload.as_ref(), b"slow");
        let empty = reader.read_frame().unwrap().unwrap();
        assert_eq!(empty.stream, StreamKind::Stderr);
        assert!(empty.payload.is_empty());
        assert!(reader.read_frame().unwrap().is_none());
    }

    #[test]
    fn would_block_is_io_error() {
        let mut reader = FrameReader::new(Trickle {
            data: Cursor::new(wire(&[(1, b"ok")])),
            step: 64,
            fail: Some(ErrorKind::WouldBlock),
        });
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::WouldBlock));
    }

    #[test]
    fn truncation_inside_header_and_payload() {
        let mut reader = FrameReader::new(Cursor::new(vec![1, 0, 0]));
        assert!(matches!(
            reader.read_frame(),
            Err(FrameError::Truncated { buffered: 3 })
        ));

        let mut raw = wire(&[(2, b"0123456789abcdef")]);
        raw.truncate(HEADER_SIZE + 9);
        let mut reader = FrameReader::new(Cursor::new(raw));
        assert!(matches!(
            reader.read_frame(),
            Err(FrameError::Truncated { buffered: 17 })
        ));
    }

    #[test]
    fn plain_text_is_rejected() {
        let mut reader = FrameReader::new(Cursor::new(b"Input #0, mov,mp4,m4a".to_vec()));
        assert!(matches!(
            reader.read_frame(),
            Err(FrameError::InvalidHeader { tag: b'I', .. })
        ));
    }

    #[test]
    fn iteration_stops_after_first_error() {
        let mut raw = b"Input #0".to_vec();
        raw.extend(wire(&[(1, b"late"), (2, b"frames")]));
        let mut reader = FrameReader::new(Cursor::new(raw));

        assert!(matches!(
            reader.next(),
            Some(Err(FrameError::InvalidHeader { tag: b'I', .. }))
        ));
        assert!(reader.next().is_none());
        assert!(reader.next().is_none());

        let frames: Vec<Result<Frame>> =
            FrameReader::new(Cursor::new(vec![1, 0, 0, 0, 0, 0, 0, 9, b'x'])).collect();
        assert_eq!(frames.len(), 1);
        assert!(matches!(frames[0], Err(FrameError::Truncated { buffered: 9 })));
    }

    #[test]
    fn payload_cap_is_checked_before_reading() {
        let mut raw = vec![1, 0, 0, 0];
        raw.extend_from_slice(&1024u32.to_be_bytes());
        let mut reader = FrameReader::with_config(
            Cursor::new(raw),
            FrameConfig {
                max_payload_size: 16,
            },
        );
        assert!(matches!(
            reader.read_frame(),
            Err(FrameError::PayloadTooLarge { size: 1024, max: 16 })
        ));
        assert_eq!(reader.get_ref().position(), HEADER_SIZE as u64);
    }

    #[test]
    fn split_routes_by_stream() {
        let raw = wire(&[(1, b"out1 "), (2, b"err"), (0, b"echo "), (1, b"out2")]);
        let (mut out, mut err) = (Vec::new(), Vec::new());

        let stats = FrameReader::new(Cursor::new(raw))
            .split_into(&mut out, &mut err)
            .unwrap();
        assert_eq!(out, b"out1 echo out2");
        assert_eq!(err, b"err");
        assert_eq!(
            stats,
            SplitStats {
                frames: 4,
                stdout_bytes: 14,
                stderr_bytes: 3
            }
        );
    }
}
