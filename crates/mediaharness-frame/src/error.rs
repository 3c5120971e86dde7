/// Errors that can occur during strict frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The header carries an unknown stream tag or non-zero padding.
    #[error("invalid stream header (tag {tag:#04x}, padding {padding:02x?})")]
    InvalidHeader { tag: u8, padding: [u8; 3] },

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended in the middle of a frame.
    #[error("stream truncated ({buffered} bytes of an incomplete frame)")]
    Truncated { buffered: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
