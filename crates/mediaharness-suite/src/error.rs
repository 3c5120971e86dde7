use std::path::PathBuf;

use mediaharness_engine::EngineError;

use crate::check::CheckFailure;

/// Errors that fail a scenario.
#[derive(Debug, thiserror::Error)]
pub enum SuiteError {
    /// The container runtime failed.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A filesystem operation on the workspace or fixtures failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Tool output could not be parsed.
    #[error("failed to parse tool output: {0}")]
    Probe(String),

    /// An output check did not hold.
    #[error("check failed: {0}")]
    Check(#[from] CheckFailure),

    /// A tool container exited non-zero.
    #[error("{image} exited with code {exit_code}")]
    ContainerFailed {
        image: String,
        exit_code: i64,
        stderr_tail: String,
    },

    /// A required input file is missing.
    #[error("missing fixture: {}", .0.display())]
    MissingFixture(PathBuf),

    /// No scenario or tool matches the given name.
    #[error("unknown scenario or tool: {0}")]
    UnknownScenario(String),

    /// The run was interrupted.
    #[error("cancelled")]
    Cancelled,
}

impl SuiteError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SuiteError>;
