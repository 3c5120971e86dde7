//! Assertions over a scenario's output directory and container logs.

use std::fmt;

use mediaharness_engine::ContainerLogs;
use mediaharness_frame::DemuxMode;

use crate::probe::ProbeOutput;
use crate::workspace::OutputDir;

/// What must hold of ffprobe's JSON output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeExpectation {
    /// Filename, format name and duration are set and there is at least one
    /// stream.
    BasicInfo,
    /// The format name contains the given text.
    FormatNameContains(String),
    /// At least one video stream, each with a codec name and a positive size.
    HasVideoStream,
}

/// A single assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    FileExists(String),
    /// File is at least `min` bytes.
    MinSize { file: String, min: u64 },
    /// File is strictly larger than `min` bytes.
    SizeAbove { file: String, min: u64 },
    /// File exists and is not empty.
    NonEmpty(String),
    /// At least one file matches the glob.
    GlobNonEmpty(String),
    Contains { file: String, needle: String },
    CountAtLeast { file: String, needle: String, min: usize },
    CountEquals { file: String, needle: String, count: usize },
    /// `larger` is strictly bigger than `smaller`.
    LargerThan { larger: String, smaller: String },
    /// The last container's de-framed logs contain the text.
    LogsContain(String),
    /// ffprobe JSON from the last container's logs.
    Probe(ProbeExpectation),
}

/// A check that did not hold.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{check}: {reason}")]
pub struct CheckFailure {
    pub check: String,
    pub reason: String,
}

/// What a check can look at.
pub struct CheckContext<'a> {
    pub workspace: &'a OutputDir,
    pub logs: Option<&'a ContainerLogs>,
    pub mode: DemuxMode,
}

impl Check {
    pub fn file_exists(file: impl Into<String>) -> Self {
        Self::FileExists(file.into())
    }

    pub fn min_size(file: impl Into<String>, min: u64) -> Self {
        Self::MinSize {
            file: file.into(),
            min,
        }
    }

    pub fn size_above(file: impl Into<String>, min: u64) -> Self {
        Self::SizeAbove {
            file: file.into(),
            min,
        }
    }

    pub fn glob(pattern: impl Into<String>) -> Self {
        Self::GlobNonEmpty(pattern.into())
    }

    pub fn contains(file: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::Contains {
            file: file.into(),
            needle: needle.into(),
        }
    }

    pub fn evaluate(&self, ctx: &CheckContext<'_>) -> Result<(), CheckFailure> {
        let fail = |reason: String| CheckFailure {
            check: self.to_string(),
            reason,
        };

        match self {
            Self::FileExists(file) => {
                size_of(ctx, file).map_err(fail)?;
                Ok(())
            }
            Self::MinSize { file, min } => {
                let size = size_of(ctx, file).map_err(fail)?;
                if size >= *min {
                    Ok(())
                } else {
                    Err(fail(format!("{size} bytes, expected at least {min}")))
                }
            }
            Self::SizeAbove { file, min } => {
                let size = size_of(ctx, file).map_err(fail)?;
                if size > *min {
                    Ok(())
                } else {
                    Err(fail(format!("{size} bytes, expected more than {min}")))
                }
            }
            Self::NonEmpty(file) => match size_of(ctx, file).map_err(fail)? {
                0 => Err(fail("file is empty".into())),
                _ => Ok(()),
            },
            Self::GlobNonEmpty(pattern) => {
                let matches = ctx.workspace.glob(pattern).map_err(|e| fail(e.to_string()))?;
                if matches.is_empty() {
                    Err(fail("no matching files".into()))
                } else {
                    Ok(())
                }
            }
            Self::Contains { file, needle } => {
                let text = ctx
                    .workspace
                    .read_to_string(file)
                    .map_err(|e| fail(e.to_string()))?;
                if text.contains(needle.as_str()) {
                    Ok(())
                } else {
                    Err(fail(format!("'{needle}' not found")))
                }
            }
            Self::CountAtLeast { file, needle, min } => {
                let found = count_in(ctx, file, needle).map_err(fail)?;
                if found >= *min {
                    Ok(())
                } else {
                    Err(fail(format!("found {found}, expected at least {min}")))
                }
            }
            Self::CountEquals {
                file,
                needle,
                count,
            } => {
                let found = count_in(ctx, file, needle).map_err(fail)?;
                if found == *count {
                    Ok(())
                } else {
                    Err(fail(format!("found {found}, expected exactly {count}")))
                }
            }
            Self::LargerThan { larger, smaller } => {
                let big = size_of(ctx, larger).map_err(fail)?;
                let small = size_of(ctx, smaller).map_err(fail)?;
                if big > small {
                    Ok(())
                } else {
                    Err(fail(format!("{big} bytes is not larger than {small} bytes")))
                }
            }
            Self::LogsContain(needle) => {
                let logs = ctx.logs.ok_or_else(|| fail("no container has run".into()))?;
                if logs.text(ctx.mode).contains(needle.as_str()) {
                    Ok(())
                } else {
                    Err(fail(format!("'{needle}' not in container output")))
                }
            }
            Self::Probe(expectation) => {
                let logs = ctx.logs.ok_or_else(|| fail("no container has run".into()))?;
                let probe = ProbeOutput::from_logs(logs).map_err(|e| fail(e.to_string()))?;
                expectation.verify(&probe).map_err(fail)
            }
        }
    }
}

impl ProbeExpectation {
    fn verify(&self, probe: &ProbeOutput) -> Result<(), String> {
        match self {
            Self::BasicInfo => {
                let format = &probe.format;
                if format.filename.is_empty() {
                    return Err("format.filename is empty".into());
                }
                if format.format_name.is_empty() {
                    return Err("format.format_name is empty".into());
                }
                if format.duration.is_empty() {
                    return Err("format.duration is empty".into());
                }
                if probe.streams.is_empty() {
                    return Err("no streams reported".into());
                }
                Ok(())
            }
            Self::FormatNameContains(needle) => {
                let name = &probe.format.format_name;
                if name.contains(needle.as_str()) {
                    Ok(())
                } else {
                    Err(format!("format name '{name}' does not contain '{needle}'"))
                }
            }
            Self::HasVideoStream => {
                if probe.streams.is_empty() {
                    return Err("no streams reported".into());
                }
                let mut videos = 0usize;
                for stream in probe.video_streams() {
                    videos += 1;
                    if stream.codec_name.is_empty() {
                        return Err(format!("video stream {} has no codec name", stream.index));
                    }
                    if stream.width == 0 || stream.height == 0 {
                        return Err(format!(
                            "video stream {} has size {}x{}",
                            stream.index, stream.width, stream.height
                        ));
                    }
                }
                if videos == 0 {
                    return Err("no video stream".into());
                }
                Ok(())
            }
        }
    }
}

fn size_of(ctx: &CheckContext<'_>, file: &str) -> Result<u64, String> {
    match ctx.workspace.file_size(file) {
        Ok(Some(size)) => Ok(size),
        Ok(None) => Err(format!("{file} does not exist")),
        Err(err) => Err(err.to_string()),
    }
}

fn count_in(ctx: &CheckContext<'_>, file: &str, needle: &str) -> Result<usize, String> {
    let text = ctx
        .workspace
        .read_to_string(file)
        .map_err(|e| e.to_string())?;
    Ok(text.matches(needle).count())
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileExists(file) => write!(f, "{file} exists"),
            Self::MinSize { file, min } => write!(f, "{file} >= {min} bytes"),
            Self::SizeAbove { file, min } => write!(f, "{file} > {min} bytes"),
            Self::NonEmpty(file) => write!(f, "{file} is not empty"),
            Self::GlobNonEmpty(pattern) => write!(f, "{pattern} matches a file"),
            Self::Contains { file, needle } => write!(f, "{file} contains '{needle}'"),
            Self::CountAtLeast { file, needle, min } => {
                write!(f, "{file} has at least {min} '{needle}'")
            }
            Self::CountEquals {
                file,
                needle,
                count,
            } => write!(f, "{file} has exactly {count} '{needle}'"),
            Self::LargerThan { larger, smaller } => write!(f, "{larger} larger than {smaller}"),
            Self::LogsContain(needle) => write!(f, "logs contain '{needle}'"),
            Self::Probe(ProbeExpectation::BasicInfo) => f.write_str("ffprobe basic info"),
            Self::Probe(ProbeExpectation::FormatNameContains(needle)) => {
                write!(f, "ffprobe format name contains '{needle}'")
            }
            Self::Probe(ProbeExpectation::HasVideoStream) => f.write_str("ffprobe video stream"),
        }
    }
}
