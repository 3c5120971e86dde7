//! Integration harness for containerized media tools.
//!
//! mediaharness runs ffmpeg, ffprobe and shaka-packager images against a
//! sample file through the Docker Engine API, then checks the files and logs
//! each tool produced.
//!
//! # Crate Structure
//!
//! - [`frame`]: Docker multiplexed log framing and de-multiplexing
//! - [`engine`]: blocking Docker Engine API client over the Unix socket
//! - [`suite`]: scenario catalog, output checks and the runner

/// Re-export frame types.
pub mod frame {
    pub use mediaharness_frame::*;
}

/// Re-export engine types.
pub mod engine {
    pub use mediaharness_engine::*;
}

/// Re-export suite types.
pub mod suite {
    pub use mediaharness_suite::*;
}

pub use mediaharness_frame::{unframe, unframe_with, DemuxMode};
