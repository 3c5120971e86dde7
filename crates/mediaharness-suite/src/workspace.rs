use std::fs;
use std::path::{Path, PathBuf};

use glob_match::glob_match;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Result, SuiteError};

/// A uniquely named output directory, removed on drop unless kept.
///
/// The directory name is a dash-less UUID v4 so concurrent runs sharing an
/// output root never collide.
#[derive(Debug)]
pub struct OutputDir {
    path: PathBuf,
    keep: bool,
}

impl OutputDir {
    /// Create a fresh directory under `root`, creating `root` if needed.
    pub fn create(root: &Path) -> Result<Self> {
        fs::create_dir_all(root).map_err(|e| SuiteError::io(root, e))?;
        let root = std::path::absolute(root).map_err(|e| SuiteError::io(root, e))?;

        let path = root.join(Uuid::new_v4().simple().to_string());
        fs::create_dir(&path).map_err(|e| SuiteError::io(&path, e))?;
        debug!(path = %path.display(), "created output directory");

        Ok(Self { path, keep: false })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Leave the directory in place when dropped.
    pub fn set_keep(&mut self, keep: bool) {
        self.keep = keep;
    }

    pub fn is_kept(&self) -> bool {
        self.keep
    }

    pub fn write_file(&self, name: &str, contents: &[u8]) -> Result<PathBuf> {
        let path = self.join(name);
        fs::write(&path, contents).map_err(|e| SuiteError::io(&path, e))?;
        Ok(path)
    }

    pub fn read_to_string(&self, name: &str) -> Result<String> {
        let path = self.join(name);
        fs::read_to_string(&path).map_err(|e| SuiteError::io(&path, e))
    }

    /// Size of `name` in bytes, or `None` if it does not exist.
    pub fn file_size(&self, name: &str) -> Result<Option<u64>> {
        let path = self.join(name);
        match fs::metadata(&path) {
            Ok(meta) => Ok(Some(meta.len())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SuiteError::io(&path, e)),
        }
    }

    /// Files directly inside the directory whose names match `pattern`,
    /// sorted by name.
    pub fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let mut matches: Vec<PathBuf> = self
            .file_names()?
            .into_iter()
            .filter(|name| glob_match(pattern, name))
            .map(|name| self.join(&name))
            .collect();
        matches.sort();
        Ok(matches)
    }

    /// Names of all entries, sorted.
    pub fn file_names(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.path).map_err(|e| SuiteError::io(&self.path, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SuiteError::io(&self.path, e))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}

impl Drop for OutputDir {
    fn drop(&mut self) {
        if self.keep {
            debug!(path = %self.path.display(), "keeping output directory");
            return;
        }
        match fs::remove_dir_all(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed output directory"),
            Err(err) => warn!(
                path = %self.path.display(),
                error = %err,
                "failed to remove output directory"
            ),
        }
    }
}
