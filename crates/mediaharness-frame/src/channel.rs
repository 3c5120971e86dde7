//! Stream tags carried in the first header byte.
//!
//! The daemon only ever emits these three values. Anything else in the tag
//! position means the bytes are not a header.

use std::fmt;

/// Data written to the container's stdin (echoed back on attach).
pub const STDIN: u8 = 0;

/// Primary output.
pub const STDOUT: u8 = 1;

/// Secondary output; ffmpeg writes its progress and diagnostics here.
pub const STDERR: u8 = 2;

/// The logical stream a frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Stdin,
    Stdout,
    Stderr,
}

impl StreamKind {
    /// Map a header tag byte to a stream, if it is one the daemon emits.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            STDIN => Some(Self::Stdin),
            STDOUT => Some(Self::Stdout),
            STDERR => Some(Self::Stderr),
            _ => None,
        }
    }

    /// The header tag byte for this stream.
    pub fn tag(self) -> u8 {
        match self {
            Self::Stdin => STDIN,
            Self::Stdout => STDOUT,
            Self::Stderr => STDERR,
        }
    }

    /// Returns a human-readable name for the stream.
    pub fn name(self) -> &'static str {
        match self {
            Self::Stdin => "stdin",
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns true if the byte is a recognised stream tag.
pub fn is_stream_tag(tag: u8) -> bool {
    tag <= STDERR
}
