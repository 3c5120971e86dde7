//! Docker multiplexed log stream framing.
//!
//! A container started without a TTY has its stdout and stderr interleaved on
//! a single attach/log stream. Every chunk written by the process is framed with:
//! - a 1-byte stream tag (0 stdin, 1 stdout, 2 stderr)
//! - 3 bytes of zero padding
//! - a 4-byte big-endian payload length
//!
//! [`unframe`] recovers the raw output from a fully buffered stream and never
//! fails. [`FrameReader`] and [`FrameWriter`] are the strict, incremental
//! counterparts for live streams.

pub mod channel;
pub mod codec;
pub mod demux;
pub mod error;
pub mod reader;
#[cfg(feature = "async")]
pub mod tokio_codec;
pub mod writer;

pub use channel::{StreamKind, STDERR, STDIN, STDOUT};
pub use codec::{
    decode_frame, encode_frame, Frame, FrameConfig, Header, DEFAULT_MAX_PAYLOAD, HEADER_SIZE,
};
pub use demux::{demux, unframe, unframe_heuristic, unframe_with, DemuxMode, Demuxed};
pub use error::{FrameError, Result};
pub use reader::{FrameReader, SplitStats};
#[cfg(feature = "async")]
pub use tokio_codec::LogCodec;
pub use writer::FrameWriter;
