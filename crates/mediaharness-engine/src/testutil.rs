//! Scripted Engine API server on a temporary Unix socket.

use std::io::{BufRead, BufReader, Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::engine::{DockerEngine, EngineConfig};

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: String,
    pub target: String,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or_default()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

pub(crate) struct Canned {
    status: u16,
    body: Vec<u8>,
    chunked: bool,
    raw: bool,
    delay: Option<Duration>,
}

impl Canned {
    pub fn json(status: u16, body: &str) -> Self {
        Self::bytes(status, body.as_bytes().to_vec())
    }

    pub fn empty(status: u16) -> Self {
        Self::bytes(status, Vec::new())
    }

    pub fn bytes(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            body,
            chunked: false,
            raw: false,
            delay: None,
        }
    }

    /// Write `bytes` verbatim, status line and headers included.
    pub fn raw(bytes: Vec<u8>) -> Self {
        Self {
            raw: true,
            ..Self::bytes(200, bytes)
        }
    }

    pub fn chunked(mut self) -> Self {
        self.chunked = true;
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn write_to(&self, out: &mut impl Write) -> std::io::Result<()> {
        if self.raw {
            out.write_all(&self.body)?;
            return out.flush();
        }
        write!(out, "HTTP/1.1 {} Fake\r\n", self.status)?;
        out.write_all(b"Api-Version: 1.47\r\nContent-Type: application/json\r\n")?;
        out.write_all(b"Connection: close\r\n")?;
        if self.chunked {
            out.write_all(b"Transfer-Encoding: chunked\r\n\r\n")?;
            for chunk in self.body.chunks(7) {
                write!(out, "{:x}\r\n", chunk.len())?;
                out.write_all(chunk)?;
                out.write_all(b"\r\n")?;
            }
            out.write_all(b"0\r\n\r\n")?;
        } else if self.status == 204 {
            out.write_all(b"\r\n")?;
        } else {
            write!(out, "Content-Length: {}\r\n\r\n", self.body.len())?;
            out.write_all(&self.body)?;
        }
        out.flush()
    }
}

pub(crate) struct FakeDaemon {
    _dir: tempfile::TempDir,
    path: PathBuf,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeDaemon {
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> Canned + Send + 'static,
    {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docker.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);

        std::thread::spawn(move || {
            for conn in listener.incoming() {
                let Ok(conn) = conn else { return };
                let Some(request) = read_request(&conn) else {
                    continue;
                };
                recorded.lock().unwrap().push(request.clone());
                let reply = handler(&request);
                if let Some(delay) = reply.delay {
                    std::thread::sleep(delay);
                }
                let _ = reply.write_to(&mut &conn);
            }
        });

        Self {
            _dir: dir,
            path,
            requests,
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.path
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn engine(&self) -> DockerEngine {
        DockerEngine::new(EngineConfig {
            socket_path: self.path.clone(),
            ..EngineConfig::default()
        })
        .unwrap()
    }
}

fn read_request(conn: &UnixStream) -> Option<RecordedRequest> {
    let mut reader = BufReader::new(conn);
    let mut line = String::new();
    reader.read_line(&mut line).ok()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?.to_string();

    let mut content_length = 0usize;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header).ok()? == 0 {
            break;
        }
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().ok()?;
            }
        }
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).ok()?;
    Some(RecordedRequest {
        method,
        target,
        body,
    })
}

/// Encode `(tag, payload)` pairs as a multiplexed log stream.
pub(crate) fn framed(parts: &[(u8, &[u8])]) -> Vec<u8> {
    let mut out = Vec::new();
    for (tag, payload) in parts {
        out.extend_from_slice(&[*tag, 0, 0, 0]);
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload);
    }
    out
}
