use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

/// A parsed image reference: `repository[:tag][@digest]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef {
    pub repository: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
}

impl ImageRef {
    pub fn parse(reference: &str) -> Result<Self, EngineError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(EngineError::InvalidSpec("empty image reference".into()));
        }

        let (name, digest) = match reference.split_once('@') {
            Some((name, digest)) if !digest.is_empty() => (name, Some(digest.to_string())),
            Some(_) => {
                return Err(EngineError::InvalidSpec(format!(
                    "empty digest in image reference: {reference}"
                )))
            }
            None => (reference, None),
        };

        // A colon after the last slash is a tag; before it, a registry port.
        let last_slash = name.rfind('/').map_or(0, |i| i + 1);
        let (repository, tag) = match name[last_slash..].rfind(':') {
            Some(i) => {
                let split = last_slash + i;
                (&name[..split], Some(name[split + 1..].to_string()))
            }
            None => (name, None),
        };

        if repository.is_empty() || tag.as_deref() == Some("") {
            return Err(EngineError::InvalidSpec(format!(
                "malformed image reference: {reference}"
            )));
        }

        Ok(Self {
            repository: repository.to_string(),
            tag,
            digest,
        })
    }

    /// Tag to pull, defaulting to `latest`.
    pub fn tag_or_latest(&self) -> &str {
        self.tag.as_deref().unwrap_or("latest")
    }

    /// Query parameters for `POST /images/create`.
    pub fn pull_params(&self) -> Vec<(&'static str, String)> {
        match &self.digest {
            Some(digest) => vec![("fromImage", format!("{}@{digest}", self.repository))],
            None => vec![
                ("fromImage", self.repository.clone()),
                ("tag", self.tag_or_latest().to_string()),
            ],
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repository)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{tag}")?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{digest}")?;
        }
        Ok(())
    }
}

impl FromStr for ImageRef {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
