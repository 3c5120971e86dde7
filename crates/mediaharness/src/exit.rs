use std::fmt;
use std::io;

use mediaharness_engine::EngineError;
use mediaharness_frame::FrameError;
use mediaharness_suite::SuiteError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const ENGINE_UNREACHABLE: i32 = 3;
pub const CHECKS_FAILED: i32 = 30;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => DATA_INVALID,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn engine_error(context: &str, err: EngineError) -> CliError {
    if let EngineError::Io(source) = err {
        return io_error(context, source);
    }
    let code = match &err {
        EngineError::Connect { source, .. } if source.kind() == io::ErrorKind::PermissionDenied => {
            PERMISSION_DENIED
        }
        EngineError::Connect { .. } => ENGINE_UNREACHABLE,
        EngineError::Timeout(_) => TIMEOUT,
        EngineError::InvalidSpec(_) => DATA_INVALID,
        EngineError::Http { .. }
        | EngineError::Protocol(_)
        | EngineError::Transport(_)
        | EngineError::Json(_)
        | EngineError::ImageNotFound(_)
        | EngineError::PullFailed { .. } => FAILURE,
        EngineError::Io(_) => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn suite_error(context: &str, err: SuiteError) -> CliError {
    match err {
        SuiteError::Engine(err) => engine_error(context, err),
        SuiteError::Io { source, path } => {
            io_error(&format!("{context} ({})", path.display()), source)
        }
        SuiteError::UnknownScenario(_) => CliError::new(USAGE, format!("{context}: {err}")),
        SuiteError::MissingFixture(_) | SuiteError::Probe(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        SuiteError::Check(_) | SuiteError::ContainerFailed { .. } => {
            CliError::new(CHECKS_FAILED, format!("{context}: {err}"))
        }
        SuiteError::Cancelled => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn unreachable_daemon_maps_to_engine_code() {
        let err = EngineError::Connect {
            path: PathBuf::from("/var/run/docker.sock"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(engine_error("ping", err).code, ENGINE_UNREACHABLE);

        let denied = EngineError::Connect {
            path: PathBuf::from("/var/run/docker.sock"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(engine_error("ping", denied).code, PERMISSION_DENIED);
    }

    #[test]
    fn engine_timeouts_and_bad_specs() {
        let timeout = EngineError::Timeout(std::time::Duration::from_secs(30));
        assert_eq!(engine_error("wait", timeout).code, TIMEOUT);
        let spec = EngineError::InvalidSpec("relative bind source".into());
        assert_eq!(engine_error("create", spec).code, DATA_INVALID);
    }

    #[test]
    fn suite_errors_keep_context() {
        let err = suite_error("select", SuiteError::UnknownScenario("ffprobe/nope".into()));
        assert_eq!(err.code, USAGE);
        assert_eq!(err.message, "select: unknown scenario or tool: ffprobe/nope");

        let missing = suite_error(
            "run",
            SuiteError::MissingFixture(PathBuf::from("testdata/sample.mp4")),
        );
        assert_eq!(missing.code, DATA_INVALID);

        let nested = suite_error(
            "run",
            SuiteError::Engine(EngineError::Timeout(std::time::Duration::from_secs(1))),
        );
        assert_eq!(nested.code, TIMEOUT);
    }

    #[test]
    fn truncated_input_is_invalid_data() {
        let err = frame_error("read", FrameError::Truncated { buffered: 3 });
        assert_eq!(err.code, DATA_INVALID);
    }
}
