//! Engine API transport.
//!
//! Requests go through `reqwest` pinned to the daemon's Unix socket. A private
//! current-thread runtime drives them so every call on [`DaemonClient`] blocks,
//! and idle connections are not pooled: each request gets its own connection.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use tokio::runtime::Runtime;
use tracing::debug;

use crate::error::{EngineError, Result};

/// Authority used in request URLs. The socket decides where they go.
const BASE_URL: &str = "http://docker";

/// Blocking HTTP client bound to one daemon socket.
#[derive(Debug, Clone)]
pub struct DaemonClient {
    socket_path: PathBuf,
    http: reqwest::Client,
    runtime: Arc<Runtime>,
}

impl DaemonClient {
    pub fn new(socket_path: impl Into<PathBuf>) -> Result<Self> {
        let socket_path = socket_path.into();
        let http = http_client(&socket_path)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            socket_path,
            http,
            runtime: Arc::new(runtime),
        })
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Send one request and read the whole body. A zero `timeout` waits
    /// indefinitely.
    pub fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        json_body: Option<Vec<u8>>,
        timeout: Duration,
    ) -> Result<Reply> {
        let mut request = self
            .http
            .request(method.clone(), format!("{BASE_URL}{path}"))
            .query(query);
        if !timeout.is_zero() {
            request = request.timeout(timeout);
        }
        if let Some(body) = json_body {
            request = request.header(CONTENT_TYPE, "application/json").body(body);
        }

        debug!(%method, path, "engine request");
        let reply = self
            .runtime
            .block_on(async {
                let response = request.send().await?;
                let status = response.status();
                let body = response.bytes().await?;
                Ok::<_, reqwest::Error>(Reply { status, body })
            })
            .map_err(|err| self.classify(err, timeout))?;
        debug!(
            status = reply.status.as_u16(),
            bytes = reply.body.len(),
            "engine response"
        );
        Ok(reply)
    }

    fn classify(&self, err: reqwest::Error, timeout: Duration) -> EngineError {
        if err.is_timeout() {
            return EngineError::Timeout(timeout);
        }
        let kind = io_kind(&err);
        let refused = matches!(
            kind,
            Some(
                io::ErrorKind::NotFound
                    | io::ErrorKind::ConnectionRefused
                    | io::ErrorKind::PermissionDenied
            )
        );
        if err.is_connect() || refused {
            return EngineError::Connect {
                path: self.socket_path.clone(),
                source: io::Error::new(kind.unwrap_or(io::ErrorKind::ConnectionRefused), err),
            };
        }
        EngineError::Transport(err)
    }
}

#[cfg(unix)]
fn http_client(socket_path: &Path) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .unix_socket(socket_path.to_path_buf())
        .pool_max_idle_per_host(0)
        .user_agent(concat!("mediaharness/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

#[cfg(not(unix))]
fn http_client(socket_path: &Path) -> Result<reqwest::Client> {
    Err(EngineError::Connect {
        path: socket_path.to_path_buf(),
        source: io::Error::new(
            io::ErrorKind::Unsupported,
            "docker socket transport requires Unix domain sockets",
        ),
    })
}

/// First `io::Error` kind in the source chain of `err`.
fn io_kind(err: &(dyn std::error::Error + 'static)) -> Option<io::ErrorKind> {
    let mut cause = err.source();
    while let Some(current) = cause {
        if let Some(io) = current.downcast_ref::<io::Error>() {
            return Some(io.kind());
        }
        cause = current.source();
    }
    None
}

/// A daemon response with its body read in full.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Bytes,
}

impl Reply {
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Body as lossy UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Turn a non-2xx reply into [`EngineError::Http`] carrying the daemon's
    /// message.
    pub fn error_for_status(self) -> Result<Self> {
        if self.status.is_success() {
            return Ok(self);
        }
        Err(EngineError::Http {
            status: self.status.as_u16(),
            message: error_message(&self),
        })
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// The daemon's `{"message": ...}`, else the body text, else the reason phrase.
pub fn error_message(reply: &Reply) -> String {
    if let Ok(body) = serde_json::from_slice::<ErrorBody>(&reply.body) {
        return body.message;
    }
    let text = reply.text();
    match text.trim() {
        "" => reply
            .status
            .canonical_reason()
            .unwrap_or("unknown status")
            .to_string(),
        text => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(status: u16, body: &str) -> Reply {
        Reply {
            status: StatusCode::from_u16(status).unwrap(),
            body: Bytes::copy_from_slice(body.as_bytes()),
        }
    }

    #[test]
    fn daemon_message_is_preferred() {
        let err = reply(404, r#"{"message":"No such image: ghcr.io/x:latest"}"#)
            .error_for_status()
            .unwrap_err();
        match err {
            EngineError::Http { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "No such image: ghcr.io/x:latest");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn plain_body_then_reason_phrase() {
        assert_eq!(error_message(&reply(500, "boom\n")), "boom");
        assert_eq!(error_message(&reply(502, "")), "Bad Gateway");
    }

    #[test]
    fn success_passes_through() {
        let ok = reply(200, "OK").error_for_status().unwrap();
        assert_eq!(ok.text(), "OK");
        let created: serde_json::Value = reply(201, r#"{"Id":"c0ffee"}"#).json().unwrap();
        assert_eq!(created["Id"], "c0ffee");
    }
}
