//! Docker Engine API client for running tools in throwaway containers.
//!
//! Talks HTTP/1.1 to the daemon over its Unix domain socket through
//! `reqwest`, one connection per request. A run is: ensure the image is
//! present, create, start, wait for exit, fetch the multiplexed log stream,
//! remove.
//!
//! Input files are staged as read-only single-file bind mounts, so nothing
//! needs to be copied into the container.

pub mod api;
pub mod client;
pub mod container;
pub mod engine;
pub mod error;
pub mod image;
pub mod runtime;
pub mod spec;

#[cfg(all(test, unix))]
mod testutil;

pub use client::{DaemonClient, Reply};
pub use container::{Container, ContainerLogs, ExitedContainer};
pub use engine::{resolve_socket_path, DockerEngine, EngineConfig, DEFAULT_SOCKET_PATH};
pub use error::{EngineError, Result};
pub use image::ImageRef;
pub use runtime::ContainerRuntime;
pub use spec::{BindMount, ContainerSpec, PullPolicy, StagedFile};
