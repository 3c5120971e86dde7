use std::path::PathBuf;
use std::time::Duration;

/// Errors that can occur talking to the Docker daemon.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Failed to connect to the daemon socket.
    #[error("failed to connect to docker daemon at {path}: {source}")]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Local I/O failed, such as starting the client runtime.
    #[error("engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The request or response failed on an established connection.
    #[error("engine transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The daemon answered with an error status.
    #[error("docker API returned {status}: {message}")]
    Http { status: u16, message: String },

    /// The daemon's response could not be parsed.
    #[error("malformed response from docker daemon: {0}")]
    Protocol(String),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The image is not present locally and pulling is disabled.
    #[error("image not found: {0}")]
    ImageNotFound(String),

    /// The registry pull reported an error.
    #[error("failed to pull {image}: {message}")]
    PullFailed { image: String, message: String },

    /// The container spec cannot be turned into a create request.
    #[error("invalid container spec: {0}")]
    InvalidSpec(String),

    /// A request did not complete in time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, EngineError>;
