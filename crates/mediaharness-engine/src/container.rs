use bytes::Bytes;
use mediaharness_frame::{demux, unframe_with, DemuxMode, Demuxed};
use tracing::{debug, warn};

use crate::engine::DockerEngine;
use crate::error::Result;

/// The raw multiplexed log stream of a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerLogs {
    raw: Bytes,
}

impl ContainerLogs {
    pub fn from_raw(raw: impl Into<Bytes>) -> Self {
        Self { raw: raw.into() }
    }

    /// The framed bytes as returned by the daemon.
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// All payload bytes with headers removed.
    pub fn unframed(&self, mode: DemuxMode) -> Bytes {
        unframe_with(&self.raw, mode)
    }

    /// Payloads split per stream.
    pub fn demux(&self) -> Demuxed {
        demux(&self.raw)
    }

    /// Unframed output as lossy UTF-8.
    pub fn text(&self, mode: DemuxMode) -> String {
        String::from_utf8_lossy(&self.unframed(mode)).into_owned()
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.demux().stdout).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.demux().stderr).into_owned()
    }

    /// The last `lines` lines of stderr, for error reports.
    pub fn stderr_tail(&self, lines: usize) -> String {
        let stderr = self.stderr_text();
        let all: Vec<&str> = stderr.lines().collect();
        let start = all.len().saturating_sub(lines);
        all[start..].join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

/// Outcome of a container that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitedContainer {
    pub id: String,
    pub image: String,
    pub exit_code: i64,
    pub logs: ContainerLogs,
}

impl ExitedContainer {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// A created container. Force-removed on drop unless already terminated.
#[derive(Debug)]
pub struct Container {
    id: String,
    image: String,
    engine: DockerEngine,
    removed: bool,
}

impl Container {
    pub(crate) fn new(engine: DockerEngine, id: String, image: String) -> Self {
        Self {
            id,
            image,
            engine,
            removed: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn start(&self) -> Result<()> {
        self.engine.start_container(&self.id)
    }

    /// Block until the container exits and return its exit code.
    pub fn wait(&self) -> Result<i64> {
        self.engine.wait_container(&self.id)
    }

    pub fn logs(&self) -> Result<ContainerLogs> {
        Ok(ContainerLogs::from_raw(
            self.engine.container_logs(&self.id)?,
        ))
    }

    /// Force-remove the container and its anonymous volumes.
    pub fn terminate(mut self) -> Result<()> {
        self.removed = true;
        self.engine.remove_container(&self.id)
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match self.engine.remove_container(&self.id) {
            Ok(()) => debug!(id = %self.id, "removed container on drop"),
            Err(err) => warn!(id = %self.id, error = %err, "failed to remove container"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framed(parts: &[(u8, &[u8])]) -> Vec<u8> {
        let mut out = Vec::new();
        for (tag, payload) in parts {
            out.extend_from_slice(&[*tag, 0, 0, 0]);
            out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
            out.extend_from_slice(payload);
        }
        out
    }

    #[test]
    fn logs_views() {
        let logs = ContainerLogs::from_raw(framed(&[
            (1, &b"{\"format\":{}}\n"[..]),
            (2, &b"line one\nline two\nline three\n"[..]),
        ]));

        assert_eq!(
            logs.text(DemuxMode::LengthPrefixed),
            "{\"format\":{}}\nline one\nline two\nline three\n"
        );
        assert_eq!(logs.stdout_text(), "{\"format\":{}}\n");
        assert_eq!(logs.stderr_tail(2), "line two\nline three");
        assert_eq!(logs.stderr_tail(10).lines().count(), 3);
        assert!(!logs.is_empty());
    }

    #[test]
    fn empty_logs() {
        let logs = ContainerLogs::default();
        assert!(logs.is_empty());
        assert_eq!(logs.text(DemuxMode::Heuristic), "");
        assert_eq!(logs.stderr_tail(5), "");
    }

    #[test]
    fn exited_success_flag() {
        let exited = ExitedContainer {
            id: "abc".into(),
            image: "alpine".into(),
            exit_code: 1,
            logs: ContainerLogs::default(),
        };
        assert!(!exited.success());
    }
}
