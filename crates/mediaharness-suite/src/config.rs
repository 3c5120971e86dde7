use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use mediaharness_engine::PullPolicy;
use mediaharness_frame::DemuxMode;

/// Default directory holding `sample.mp4`; also the default output root.
pub const DEFAULT_TESTDATA_DIR: &str = "testdata";
pub const DEFAULT_SAMPLE_NAME: &str = "sample.mp4";
const DEFAULT_LOG_TAIL_LINES: usize = 20;

/// A tool image family under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tool {
    FfmpegLite,
    FfmpegSplit,
    FfmpegConcat,
    FfmpegThumbnail,
    Ffprobe,
    ShakaPackager,
}

impl Tool {
    pub const ALL: [Tool; 6] = [
        Tool::FfmpegLite,
        Tool::FfmpegSplit,
        Tool::FfmpegConcat,
        Tool::FfmpegThumbnail,
        Tool::Ffprobe,
        Tool::ShakaPackager,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FfmpegLite => "ffmpeg-lite",
            Self::FfmpegSplit => "ffmpeg-split",
            Self::FfmpegConcat => "ffmpeg-concat",
            Self::FfmpegThumbnail => "ffmpeg-thumbnail",
            Self::Ffprobe => "ffprobe",
            Self::ShakaPackager => "shaka-packager",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Tool::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Tool::ALL.iter().map(|t| t.as_str()).collect();
                format!("unknown tool '{s}' (expected one of: {})", names.join(", "))
            })
    }
}

/// Image reference per tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSet {
    pub ffmpeg_lite: String,
    pub ffmpeg_split: String,
    pub ffmpeg_concat: String,
    pub ffmpeg_thumbnail: String,
    pub ffprobe: String,
    pub shaka_packager: String,
}

impl Default for ImageSet {
    fn default() -> Self {
        Self {
            ffmpeg_lite: "ghcr.io/veloxpack/ffmpeg:8.0-lite".into(),
            ffmpeg_split: "ghcr.io/veloxpack/ffmpeg:8.0-split".into(),
            ffmpeg_concat: "ghcr.io/veloxpack/ffmpeg:8.0-concat".into(),
            ffmpeg_thumbnail: "ghcr.io/veloxpack/ffmpeg:8.0-thumbnail".into(),
            ffprobe: "ghcr.io/veloxpack/ffprobe:latest".into(),
            shaka_packager: "ghcr.io/veloxpack/shaka-packager:latest".into(),
        }
    }
}

impl ImageSet {
    pub fn image(&self, tool: Tool) -> &str {
        match tool {
            Tool::FfmpegLite => &self.ffmpeg_lite,
            Tool::FfmpegSplit => &self.ffmpeg_split,
            Tool::FfmpegConcat => &self.ffmpeg_concat,
            Tool::FfmpegThumbnail => &self.ffmpeg_thumbnail,
            Tool::Ffprobe => &self.ffprobe,
            Tool::ShakaPackager => &self.shaka_packager,
        }
    }

    pub fn set(&mut self, tool: Tool, image: impl Into<String>) {
        let slot = match tool {
            Tool::FfmpegLite => &mut self.ffmpeg_lite,
            Tool::FfmpegSplit => &mut self.ffmpeg_split,
            Tool::FfmpegConcat => &mut self.ffmpeg_concat,
            Tool::FfmpegThumbnail => &mut self.ffmpeg_thumbnail,
            Tool::Ffprobe => &mut self.ffprobe,
            Tool::ShakaPackager => &mut self.shaka_packager,
        };
        *slot = image.into();
    }
}

/// Settings shared by every scenario in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteConfig {
    /// Directory holding the sample media.
    pub testdata_dir: PathBuf,
    /// File name of the sample inside `testdata_dir`.
    pub sample_name: String,
    /// Where per-scenario output directories are created. Defaults to
    /// `testdata_dir`.
    pub output_root: Option<PathBuf>,
    pub images: ImageSet,
    /// How container logs are de-framed before parsing.
    pub demux_mode: DemuxMode,
    pub pull_policy: PullPolicy,
    /// Keep output directories after the run.
    pub keep_outputs: bool,
    /// Stderr lines quoted when a container fails.
    pub log_tail_lines: usize,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            testdata_dir: PathBuf::from(DEFAULT_TESTDATA_DIR),
            sample_name: DEFAULT_SAMPLE_NAME.to_string(),
            output_root: None,
            images: ImageSet::default(),
            demux_mode: DemuxMode::default(),
            pull_policy: PullPolicy::default(),
            keep_outputs: false,
            log_tail_lines: DEFAULT_LOG_TAIL_LINES,
        }
    }
}

impl SuiteConfig {
    pub fn sample_path(&self) -> PathBuf {
        self.testdata_dir.join(&self.sample_name)
    }

    pub fn output_root(&self) -> &Path {
        self.output_root.as_deref().unwrap_or(&self.testdata_dir)
    }
}
