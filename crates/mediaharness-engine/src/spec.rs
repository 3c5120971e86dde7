use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::api::{CreateContainerBody, HostConfig};
use crate::error::{EngineError, Result};
use crate::image::ImageRef;

/// Label set on every container this crate creates.
pub const MANAGED_LABEL: &str = "dev.mediaharness.managed";

/// When to pull the image before creating a container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PullPolicy {
    /// Pull only if the image is not present locally.
    #[default]
    IfMissing,
    /// Always pull.
    Always,
    /// Never pull; fail if the image is absent.
    Never,
}

/// A host file exposed read-only at a path inside the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub host_path: PathBuf,
    pub container_path: String,
}

/// A host directory mounted into the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindMount {
    pub source: PathBuf,
    pub target: String,
    pub read_only: bool,
}

impl BindMount {
    pub fn new(source: impl Into<PathBuf>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            read_only: false,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// `source:target[:ro]` as the daemon expects in `HostConfig.Binds`.
    pub fn to_bind(&self) -> String {
        let source = trim_trailing_slash(&self.source.to_string_lossy()).to_string();
        let target = trim_trailing_slash(&self.target).to_string();
        if self.read_only {
            format!("{source}:{target}:ro")
        } else {
            format!("{source}:{target}")
        }
    }
}

fn trim_trailing_slash(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// Everything needed to run one tool invocation in a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    image: String,
    cmd: Vec<String>,
    entrypoint: Option<Vec<String>>,
    env: BTreeMap<String, String>,
    working_dir: Option<String>,
    files: Vec<StagedFile>,
    mounts: Vec<BindMount>,
    labels: BTreeMap<String, String>,
    pull_policy: PullPolicy,
}

impl ContainerSpec {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            cmd: Vec::new(),
            entrypoint: None,
            env: BTreeMap::new(),
            working_dir: None,
            files: Vec::new(),
            mounts: Vec::new(),
            labels: BTreeMap::new(),
            pull_policy: PullPolicy::default(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.cmd.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cmd.extend(args.into_iter().map(Into::into));
        self
    }

    /// Replace the image entrypoint. An empty list clears it.
    pub fn entrypoint<I, S>(mut self, entrypoint: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entrypoint = Some(entrypoint.into_iter().map(Into::into).collect());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn working_dir(mut self, dir: impl Into<String>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Expose `host_path` read-only at `container_path`.
    pub fn stage_file(
        mut self,
        host_path: impl Into<PathBuf>,
        container_path: impl Into<String>,
    ) -> Self {
        self.files.push(StagedFile {
            host_path: host_path.into(),
            container_path: container_path.into(),
        });
        self
    }

    pub fn bind(mut self, mount: BindMount) -> Self {
        self.mounts.push(mount);
        self
    }

    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn pull_policy(mut self, policy: PullPolicy) -> Self {
        self.pull_policy = policy;
        self
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn cmd(&self) -> &[String] {
        &self.cmd
    }

    pub fn files(&self) -> &[StagedFile] {
        &self.files
    }

    pub fn mounts(&self) -> &[BindMount] {
        &self.mounts
    }

    pub fn env_vars(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn policy(&self) -> PullPolicy {
        self.pull_policy
    }

    /// Check this container definition against what the daemon will accept.
    ///
    /// Bind sources must be absolute host paths; staged files must exist.
    pub fn validate(&self) -> Result<()> {
        ImageRef::parse(&self.image)?;

        for file in &self.files {
            require_absolute(&file.host_path)?;
            require_container_path(&file.container_path)?;
            if !file.host_path.is_file() {
                return Err(EngineError::InvalidSpec(format!(
                    "staged file does not exist: {}",
                    file.host_path.display()
                )));
            }
        }

        for mount in &self.mounts {
            require_absolute(&mount.source)?;
            require_container_path(&mount.target)?;
        }

        for key in self.env.keys() {
            if key.is_empty() || key.contains('=') {
                return Err(EngineError::InvalidSpec(format!(
                    "invalid environment variable name: {key:?}"
                )));
            }
        }

        Ok(())
    }

    /// The `POST /containers/create` body for this spec.
    pub fn to_create_body(&self) -> CreateContainerBody {
        let mut binds: Vec<String> = self
            .files
            .iter()
            .map(|f| {
                BindMount::new(f.host_path.clone(), f.container_path.clone())
                    .read_only()
                    .to_bind()
            })
            .collect();
        binds.extend(self.mounts.iter().map(BindMount::to_bind));

        let mut labels = self.labels.clone();
        labels.insert(MANAGED_LABEL.to_string(), "true".to_string());

        CreateContainerBody {
            image: self.image.clone(),
            cmd: self.cmd.clone(),
            entrypoint: self.entrypoint.clone(),
            env: self.env.iter().map(|(k, v)| format!("{k}={v}")).collect(),
            working_dir: self.working_dir.clone(),
            labels,
            tty: false,
            attach_stdin: false,
            attach_stdout: true,
            attach_stderr: true,
            host_config: HostConfig {
                binds,
                auto_remove: false,
            },
        }
    }
}

fn require_absolute(path: &Path) -> Result<()> {
    if path.is_absolute() {
        Ok(())
    } else {
        Err(EngineError::InvalidSpec(format!(
            "host path must be absolute: {}",
            path.display()
        )))
    }
}

fn require_container_path(path: &str) -> Result<()> {
    if path.starts_with('/') {
        Ok(())
    } else {
        Err(EngineError::InvalidSpec(format!(
            "container path must be absolute: {path}"
        )))
    }
}
