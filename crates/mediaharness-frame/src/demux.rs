//! Best-effort de-framing of a fully buffered log stream.
//!
//! Nothing here returns an error. Input that is empty, unframed, or cut off
//! mid-frame still produces output; the worst case is that header bytes leak
//! through (unframed input) or are dropped (heuristic mode, see below).

use std::fmt;
use std::str::FromStr;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::channel::StreamKind;
use crate::codec::{Header, HEADER_SIZE};

/// How [`unframe_with`] finds payload boundaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DemuxMode {
    /// Honour each header's declared length.
    #[default]
    LengthPrefixed,
    /// Drop every 8-byte window that looks like a header and keep everything
    /// else. The declared length is ignored, so payload bytes that happen to
    /// look like a header are lost.
    Heuristic,
}

impl DemuxMode {
    /// Stable name used in config and CLI flags.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LengthPrefixed => "length",
            Self::Heuristic => "heuristic",
        }
    }
}

impl fmt::Display for DemuxMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DemuxMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "length" | "length-prefixed" => Ok(Self::LengthPrefixed),
            "heuristic" | "legacy" => Ok(Self::Heuristic),
            other => Err(format!(
                "unknown demux mode '{other}' (expected 'length' or 'heuristic')"
            )),
        }
    }
}

/// Output of a stream split per channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Demuxed {
    /// Stdout payloads, plus stdin echoes and any unframed remainder.
    pub stdout: Bytes,
    /// Stderr payloads.
    pub stderr: Bytes,
}

/// Strip framing from `raw` using the declared payload lengths.
///
/// Stops framing at the first position that does not hold a valid header and
/// copies the rest verbatim; a short trailing header is copied as-is and a
/// truncated final payload is emitted as far as it goes.
pub fn unframe(raw: &[u8]) -> Bytes {
    let mut out = BytesMut::with_capacity(raw.len());
    for_each_segment(raw, |_, segment| out.extend_from_slice(segment));
    out.freeze()
}

/// Strip framing from `raw` by pattern matching alone.
///
/// Kept for byte-for-byte parity with log consumers that scan for headers
/// instead of reading lengths.
pub fn unframe_heuristic(raw: &[u8]) -> Bytes {
    let mut out = BytesMut::with_capacity(raw.len());
    let mut cursor = 0usize;

    while cursor < raw.len() {
        if Header::matches(&raw[cursor..]) {
            cursor += HEADER_SIZE;
            continue;
        }
        out.put_u8(raw[cursor]);
        cursor += 1;
    }

    out.freeze()
}

/// Strip framing from `raw` with an explicit mode.
pub fn unframe_with(raw: &[u8], mode: DemuxMode) -> Bytes {
    match mode {
        DemuxMode::LengthPrefixed => unframe(raw),
        DemuxMode::Heuristic => unframe_heuristic(raw),
    }
}

/// Split `raw` into stdout and stderr using the declared payload lengths.
pub fn demux(raw: &[u8]) -> Demuxed {
    let mut stdout = BytesMut::new();
    let mut stderr = BytesMut::new();

    for_each_segment(raw, |stream, segment| match stream {
        Some(StreamKind::Stderr) => stderr.extend_from_slice(segment),
        Some(StreamKind::Stdout) | Some(StreamKind::Stdin) | None => {
            stdout.extend_from_slice(segment)
        }
    });

    Demuxed {
        stdout: stdout.freeze(),
        stderr: stderr.freeze(),
    }
}

/// Walk `raw` frame by frame. `None` marks bytes that were not framed.
fn for_each_segment(raw: &[u8], mut sink: impl FnMut(Option<StreamKind>, &[u8])) {
    let mut cursor = 0usize;

    while cursor < raw.len() {
        let rest = &raw[cursor..];
        let Some(header) = Header::parse(rest) else {
            if cursor > 0 {
                trace!(offset = cursor, remaining = rest.len(), "unframed tail");
            }
            sink(None, rest);
            return;
        };

        let start = cursor + HEADER_SIZE;
        let end = start.saturating_add(header.len as usize).min(raw.len());
        sink(Some(header.stream), &raw[start..end]);
        cursor = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(tag: u8, len: u32) -> Vec<u8> {
        let mut out = vec![tag, 0, 0, 0];
        out.extend_from_slice(&len.to_be_bytes());
        out
    }

    fn framed(parts: &[(u8, &[u8])]) -> Vec<u8> {
        let mut out = Vec::new();
        for (tag, payload) in parts {
            out.extend_from_slice(&header(*tag, payload.len() as u32));
            out.extend_from_slice(payload);
        }
        out
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(unframe(b"").is_empty());
        assert!(unframe_heuristic(b"").is_empty());
        assert_eq!(demux(b""), Demuxed::default());
    }

    #[test]
    fn single_stdout_frame() {
        let raw = [
            0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x05, b'h', b'e', b'l', b'l', b'o',
        ];
        assert_eq!(unframe(&raw).as_ref(), b"hello");
        assert_eq!(unframe_heuristic(&raw).as_ref(), b"hello");
    }

    #[test]
    fn header_without_payload_yields_nothing() {
        let raw = [0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x05];
        assert!(unframe(&raw).is_empty());
        assert!(unframe_heuristic(&raw).is_empty());
    }

    #[test]
    fn headers_only_yield_nothing() {
        let mut raw = header(1, 0);
        raw.extend(header(2, 0));
        raw.extend(header(0, 0));
        assert!(unframe(&raw).is_empty());
        assert!(unframe_heuristic(&raw).is_empty());
    }

    #[test]
    fn headerless_input_passes_through() {
        let text = b"ffprobe version 8.0 Copyright (c) 2007-2025\n{\n  \"format\": {}\n}\n";
        assert_eq!(unframe(text).as_ref(), text.as_ref());
        assert_eq!(unframe_heuristic(text).as_ref(), text.as_ref());
    }

    #[test]
    fn interleaved_frames_concatenate_in_order() {
        let raw = framed(&[
            (1, &b"{\"format\":"[..]),
            (2, &b"Input #0, mov,mp4\n"[..]),
            (1, &b"{}}"[..]),
        ]);
        let expected = b"{\"format\":Input #0, mov,mp4\n{}}";
        assert_eq!(unframe(&raw).as_ref(), expected.as_ref());
        assert_eq!(unframe_heuristic(&raw).as_ref(), expected.as_ref());
    }

    #[test]
    fn heuristic_ignores_declared_lengths() {
        // Lengths deliberately wrong: the scan only looks at the tag and padding.
        let mut raw = header(1, 999);
        raw.extend_from_slice(b"abc");
        raw.extend(header(2, 0xdead_beef));
        raw.extend_from_slice(b"def");
        assert_eq!(unframe_heuristic(&raw).as_ref(), b"abcdef");
    }

    #[test]
    fn short_tail_is_copied_verbatim() {
        let mut raw = framed(&[(1, &b"ok"[..])]);
        raw.extend_from_slice(&[0x01, 0x00, 0x00, 0x00, 0x00]);
        let expected = [b'o', b'k', 0x01, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(unframe(&raw).as_ref(), expected.as_ref());
        assert_eq!(unframe_heuristic(&raw).as_ref(), expected.as_ref());
    }

    #[test]
    fn truncated_payload_is_emitted_as_far_as_it_goes() {
        let mut raw = header(1, 10);
        raw.extend_from_slice(b"part");
        assert_eq!(unframe(&raw).as_ref(), b"part");
    }

    #[test]
    fn heuristic_swallows_header_lookalike_payload() {
        // Legacy behaviour: a payload that begins with 02 00 00 00 is taken
        // for a header and its first 8 bytes disappear.
        let payload = [0x02, 0x00, 0x00, 0x00, b'w', b'x', b'y', b'z', b'!', b'?'];
        let raw = framed(&[(1, &payload[..])]);
        assert_eq!(unframe_heuristic(&raw).as_ref(), b"!?");
    }

    #[test]
    fn length_prefixed_preserves_header_lookalike_payload() {
        let payload = [0x02, 0x00, 0x00, 0x00, b'w', b'x', b'y', b'z', b'!', b'?'];
        let raw = framed(&[(1, &payload[..])]);
        assert_eq!(unframe(&raw).as_ref(), payload.as_ref());
    }

    #[test]
    fn length_prefixed_copies_rest_after_garbage() {
        let mut raw = framed(&[(1, &b"framed "[..])]);
        raw.extend_from_slice(b"then raw tty output\x01\x00\x00\x00\x00\x00\x00\x01z");
        assert_eq!(
            unframe(&raw).as_ref(),
            b"framed then raw tty output\x01\x00\x00\x00\x00\x00\x00\x01z".as_ref()
        );
    }

    #[test]
    fn demux_routes_by_stream() {
        let raw = framed(&[
            (1, &b"{\"streams\":[]}"[..]),
            (2, &b"[mov,mp4] stream 0\n"[..]),
            (0, &b"echo"[..]),
            (2, &b"done\n"[..]),
        ]);
        let out = demux(&raw);
        assert_eq!(out.stdout.as_ref(), b"{\"streams\":[]}echo");
        assert_eq!(out.stderr.as_ref(), b"[mov,mp4] stream 0\ndone\n");
    }

    #[test]
    fn demux_sends_unframed_bytes_to_stdout() {
        let out = demux(b"plain tty log");
        assert_eq!(out.stdout.as_ref(), b"plain tty log");
        assert!(out.stderr.is_empty());
    }

    #[test]
    fn unframe_with_dispatches_on_mode() {
        let payload = [0x00, 0x00, 0x00, 0x00, 1, 2, 3, 4, 5];
        let raw = framed(&[(2, &payload[..])]);
        assert_eq!(
            unframe_with(&raw, DemuxMode::LengthPrefixed).as_ref(),
            payload.as_ref()
        );
        assert_eq!(unframe_with(&raw, DemuxMode::Heuristic).as_ref(), &[5]);
    }

    #[test]
    fn mode_parses_from_config_strings() {
        assert_eq!("length".parse::<DemuxMode>(), Ok(DemuxMode::LengthPrefixed));
        assert_eq!("Heuristic".parse::<DemuxMode>(), Ok(DemuxMode::Heuristic));
        assert_eq!("legacy".parse::<DemuxMode>(), Ok(DemuxMode::Heuristic));
        assert!("bogus".parse::<DemuxMode>().is_err());
        assert_eq!(DemuxMode::default().to_string(), "length");
    }
}
