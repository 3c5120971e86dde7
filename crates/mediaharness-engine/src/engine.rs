use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use reqwest::{Method, StatusCode};
use tracing::{debug, info, warn};

use crate::api::{CreateContainerResponse, PullProgress, VersionInfo, WaitResponse};
use crate::client::{DaemonClient, Reply};
use crate::container::{Container, ExitedContainer};
use crate::error::{EngineError, Result};
use crate::image::ImageRef;
use crate::runtime::ContainerRuntime;
use crate::spec::{ContainerSpec, PullPolicy};

/// Where the daemon listens when `DOCKER_HOST` does not say otherwise.
pub const DEFAULT_SOCKET_PATH: &str = "/var/run/docker.sock";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(600);
const DEFAULT_PULL_TIMEOUT: Duration = Duration::from_secs(900);

/// Connection settings for [`DockerEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Path of the daemon's Unix socket.
    pub socket_path: PathBuf,
    /// Timeout for ordinary API calls.
    pub request_timeout: Duration,
    /// How long to wait for a container to exit.
    pub wait_timeout: Duration,
    /// How long an image pull may take.
    pub pull_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            pull_timeout: DEFAULT_PULL_TIMEOUT,
        }
    }
}

impl EngineConfig {
    /// Defaults with the socket taken from `DOCKER_HOST` when it names one.
    pub fn from_env() -> Self {
        Self {
            socket_path: resolve_socket_path(std::env::var("DOCKER_HOST").ok().as_deref()),
            ..Self::default()
        }
    }
}

/// Map a `DOCKER_HOST` value to a socket path.
///
/// Only `unix://` hosts are supported; anything else falls back to the
/// default socket.
pub fn resolve_socket_path(docker_host: Option<&str>) -> PathBuf {
    match docker_host.map(str::trim).filter(|h| !h.is_empty()) {
        Some(host) => match host.strip_prefix("unix://") {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => {
                warn!(host, "DOCKER_HOST is not a unix socket, using default");
                PathBuf::from(DEFAULT_SOCKET_PATH)
            }
        },
        None => PathBuf::from(DEFAULT_SOCKET_PATH),
    }
}

/// Blocking client for the Docker Engine API.
#[derive(Debug, Clone)]
pub struct DockerEngine {
    config: EngineConfig,
    client: DaemonClient,
}

impl DockerEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let client = DaemonClient::new(&config.socket_path)?;
        Ok(Self { config, client })
    }

    /// Client configured from the environment.
    pub fn from_env() -> Result<Self> {
        Self::new(EngineConfig::from_env())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn call(&self, method: Method, path: &str, query: &[(&str, &str)]) -> Result<Reply> {
        self.client
            .send(method, path, query, None, self.config.request_timeout)
    }

    /// `GET /_ping`.
    pub fn ping(&self) -> Result<()> {
        let reply = self.call(Method::GET, "/_ping", &[])?.error_for_status()?;
        let text = reply.text();
        if text.trim() == "OK" {
            Ok(())
        } else {
            Err(EngineError::Protocol(format!(
                "unexpected ping response: {text}"
            )))
        }
    }

    /// `GET /version`.
    pub fn version(&self) -> Result<VersionInfo> {
        self.call(Method::GET, "/version", &[])?
            .error_for_status()?
            .json()
    }

    /// Whether `image` is present locally.
    pub fn image_exists(&self, image: &str) -> Result<bool> {
        let reply = self.call(Method::GET, &format!("/images/{image}/json"), &[])?;
        if reply.status == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        reply.error_for_status()?;
        Ok(true)
    }

    /// Pull `image` from its registry, failing on any error in the progress
    /// stream.
    pub fn pull_image(&self, image: &str) -> Result<()> {
        let reference = ImageRef::parse(image)?;
        let owned = reference.pull_params();
        let params: Vec<(&str, &str)> = owned.iter().map(|(k, v)| (*k, v.as_str())).collect();

        info!(image, "pulling image");
        let reply = self
            .client
            .send(
                Method::POST,
                "/images/create",
                &params,
                None,
                self.config.pull_timeout,
            )?
            .error_for_status()?;

        for line in reply.body.split(|b| *b == b'\n') {
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            let progress: PullProgress = match serde_json::from_slice(line) {
                Ok(progress) => progress,
                Err(err) => {
                    debug!(error = %err, "skipping unparseable pull progress line");
                    continue;
                }
            };
            if let Some(message) = progress.error_message() {
                return Err(EngineError::PullFailed {
                    image: image.to_string(),
                    message: message.to_string(),
                });
            }
            if let Some(status) = &progress.status {
                debug!(image, status = status.as_str(), "pull progress");
            }
        }

        info!(image, "image pulled");
        Ok(())
    }

    /// Make sure `image` is available according to `policy`.
    pub fn ensure_image(&self, image: &str, policy: PullPolicy) -> Result<()> {
        match policy {
            PullPolicy::Always => self.pull_image(image),
            PullPolicy::IfMissing => {
                if self.image_exists(image)? {
                    debug!(image, "image present");
                    Ok(())
                } else {
                    self.pull_image(image)
                }
            }
            PullPolicy::Never => {
                if self.image_exists(image)? {
                    Ok(())
                } else {
                    Err(EngineError::ImageNotFound(image.to_string()))
                }
            }
        }
    }

    /// `POST /containers/create`. Returns the new container id.
    pub fn create_container(&self, spec: &ContainerSpec) -> Result<String> {
        let body = serde_json::to_vec(&spec.to_create_body())?;
        let reply = self.client.send(
            Method::POST,
            "/containers/create",
            &[],
            Some(body),
            self.config.request_timeout,
        )?;
        if reply.status == StatusCode::NOT_FOUND {
            return Err(EngineError::ImageNotFound(spec.image().to_string()));
        }

        let created: CreateContainerResponse = reply.error_for_status()?.json()?;
        for warning in created.warnings.iter().flatten() {
            warn!(id = %created.id, warning = warning.as_str(), "daemon warning on create");
        }
        debug!(id = %created.id, image = spec.image(), "container created");
        Ok(created.id)
    }

    pub fn start_container(&self, id: &str) -> Result<()> {
        let reply = self.call(Method::POST, &format!("/containers/{id}/start"), &[])?;
        if reply.status == StatusCode::NOT_MODIFIED {
            debug!(id, "container already started");
            return Ok(());
        }
        reply.error_for_status()?;
        debug!(id, "container started");
        Ok(())
    }

    /// Block until the container stops; returns its exit code.
    pub fn wait_container(&self, id: &str) -> Result<i64> {
        let waited: WaitResponse = self
            .client
            .send(
                Method::POST,
                &format!("/containers/{id}/wait"),
                &[("condition", "not-running")],
                None,
                self.config.wait_timeout,
            )?
            .error_for_status()?
            .json()?;

        if let Some(error) = waited.error.filter(|e| !e.message.is_empty()) {
            return Err(EngineError::Protocol(format!(
                "wait on {id} failed: {}",
                error.message
            )));
        }
        Ok(waited.status_code)
    }

    /// The container's full log stream, stdout and stderr multiplexed.
    pub fn container_logs(&self, id: &str) -> Result<Bytes> {
        let reply = self
            .call(
                Method::GET,
                &format!("/containers/{id}/logs"),
                &[("stdout", "1"), ("stderr", "1")],
            )?
            .error_for_status()?;
        Ok(reply.body)
    }

    /// Force-remove a container and its anonymous volumes. Already-gone
    /// containers are not an error.
    pub fn remove_container(&self, id: &str) -> Result<()> {
        let reply = self.call(
            Method::DELETE,
            &format!("/containers/{id}"),
            &[("force", "1"), ("v", "1")],
        )?;
        if reply.status == StatusCode::NOT_FOUND {
            debug!(id, "container already removed");
            return Ok(());
        }
        reply.error_for_status()?;
        debug!(id, "container removed");
        Ok(())
    }

    /// Validate `spec`, make the image available, then create and start a
    /// container. The returned handle removes the container on drop.
    pub fn launch(&self, spec: &ContainerSpec) -> Result<Container> {
        spec.validate()?;
        self.ensure_image(spec.image(), spec.policy())?;
        let id = self.create_container(spec)?;
        let container = Container::new(self.clone(), id, spec.image().to_string());
        container.start()?;
        info!(id = container.id(), image = spec.image(), "container running");
        Ok(container)
    }
}

impl ContainerRuntime for DockerEngine {
    fn run(&self, spec: &ContainerSpec) -> Result<ExitedContainer> {
        let container = self.launch(spec)?;
        let exit_code = container.wait()?;
        let logs = container.logs()?;
        let id = container.id().to_string();

        if let Err(err) = container.terminate() {
            warn!(id = %id, error = %err, "failed to remove exited container");
        }
        info!(id = %id, image = spec.image(), exit_code, "container exited");

        Ok(ExitedContainer {
            id,
            image: spec.image().to_string(),
            exit_code,
            logs,
        })
    }
}
