use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use mediaharness_engine::PullPolicy;
use mediaharness_frame::{DemuxMode, StreamKind};
use mediaharness_suite::Tool;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod doctor;
pub mod frame;
pub mod list;
pub mod run;
pub mod unframe;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run scenarios against the Docker daemon.
    Run(RunArgs),
    /// List the scenario catalog.
    List(ListArgs),
    /// Strip Docker log framing from stdin.
    Unframe(UnframeArgs),
    /// Wrap stdin in Docker log frames.
    Frame(FrameArgs),
    /// Check the daemon, sample file and output directory.
    Doctor(DoctorArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Run(args) => run::run(args, format),
        Command::List(args) => list::run(args, format),
        Command::Unframe(args) => unframe::run(args),
        Command::Frame(args) => frame::run(args),
        Command::Doctor(args) => doctor::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Where the daemon and the sample live.
#[derive(Args, Debug, Clone)]
pub struct EnvArgs {
    /// Docker host; only unix:// sockets are supported.
    #[arg(long = "docker-host", env = "DOCKER_HOST", value_name = "URL")]
    pub docker_host: Option<String>,
    /// Directory holding the sample media.
    #[arg(long, env = "MEDIAHARNESS_TESTDATA", default_value = "testdata")]
    pub testdata: PathBuf,
    /// Sample file name inside the testdata directory.
    #[arg(long, default_value = "sample.mp4")]
    pub sample: String,
    /// Root for per-scenario output directories. Default: the testdata directory.
    #[arg(long, env = "MEDIAHARNESS_OUTPUT_ROOT", value_name = "DIR")]
    pub output_root: Option<PathBuf>,
}

/// Image overrides, one per tool.
#[derive(Args, Debug, Clone, Default)]
pub struct ImageArgs {
    #[arg(long, env = "MEDIAHARNESS_FFMPEG_LITE_IMAGE", value_name = "IMAGE")]
    pub ffmpeg_lite_image: Option<String>,
    #[arg(long, env = "MEDIAHARNESS_FFMPEG_SPLIT_IMAGE", value_name = "IMAGE")]
    pub ffmpeg_split_image: Option<String>,
    #[arg(long, env = "MEDIAHARNESS_FFMPEG_CONCAT_IMAGE", value_name = "IMAGE")]
    pub ffmpeg_concat_image: Option<String>,
    #[arg(long, env = "MEDIAHARNESS_FFMPEG_THUMBNAIL_IMAGE", value_name = "IMAGE")]
    pub ffmpeg_thumbnail_image: Option<String>,
    #[arg(long, env = "MEDIAHARNESS_FFPROBE_IMAGE", value_name = "IMAGE")]
    pub ffprobe_image: Option<String>,
    #[arg(long, env = "MEDIAHARNESS_SHAKA_PACKAGER_IMAGE", value_name = "IMAGE")]
    pub shaka_packager_image: Option<String>,
}

impl ImageArgs {
    pub fn overrides(&self) -> impl Iterator<Item = (Tool, &str)> {
        [
            (Tool::FfmpegLite, &self.ffmpeg_lite_image),
            (Tool::FfmpegSplit, &self.ffmpeg_split_image),
            (Tool::FfmpegConcat, &self.ffmpeg_concat_image),
            (Tool::FfmpegThumbnail, &self.ffmpeg_thumbnail_image),
            (Tool::Ffprobe, &self.ffprobe_image),
            (Tool::ShakaPackager, &self.shaka_packager_image),
        ]
        .into_iter()
        .filter_map(|(tool, image)| image.as_deref().map(|image| (tool, image)))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PullArg {
    Missing,
    Always,
    Never,
}

impl From<PullArg> for PullPolicy {
    fn from(arg: PullArg) -> Self {
        match arg {
            PullArg::Missing => PullPolicy::IfMissing,
            PullArg::Always => PullPolicy::Always,
            PullArg::Never => PullPolicy::Never,
        }
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Scenario or tool names (e.g. `ffprobe`, `shaka-packager/hls`). Default: all.
    pub selectors: Vec<String>,
    /// Only run scenarios for these tools (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub tool: Vec<Tool>,
    #[command(flatten)]
    pub env: EnvArgs,
    #[command(flatten)]
    pub images: ImageArgs,
    /// How container logs are de-framed.
    #[arg(long, env = "MEDIAHARNESS_DEMUX_MODE", default_value = "length")]
    pub mode: DemuxMode,
    /// When to pull tool images.
    #[arg(long, value_enum, default_value = "missing")]
    pub pull: PullArg,
    /// Keep output directories after the run.
    #[arg(long)]
    pub keep: bool,
    /// Stderr lines quoted when a container fails.
    #[arg(long, default_value = "20")]
    pub tail: usize,
    /// Maximum time to wait for one container to exit (e.g. 10m, 90s).
    #[arg(long, default_value = "10m")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only list scenarios for these tools (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub tool: Vec<Tool>,
    #[command(flatten)]
    pub images: ImageArgs,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StreamArg {
    /// Every payload in stream order.
    All,
    Stdout,
    Stderr,
}

impl StreamArg {
    /// Stdin echoes count as stdout, as in [`mediaharness_frame::demux`].
    pub fn keeps(self, stream: StreamKind) -> bool {
        match self {
            Self::All => true,
            Self::Stdout => stream != StreamKind::Stderr,
            Self::Stderr => stream == StreamKind::Stderr,
        }
    }
}

#[derive(Args, Debug)]
pub struct UnframeArgs {
    /// Read from a file instead of stdin.
    #[arg(long, short = 'i', value_name = "FILE")]
    pub input: Option<PathBuf>,
    /// Boundary detection mode.
    #[arg(long, default_value = "length")]
    pub mode: DemuxMode,
    /// Which stream to keep. Per-stream output always uses declared lengths.
    #[arg(long, value_enum, default_value = "all")]
    pub stream: StreamArg,
    /// Stream frame by frame and fail on malformed input instead of
    /// passing it through. `--mode` is ignored.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FrameStreamArg {
    Stdin,
    Stdout,
    Stderr,
}

impl From<FrameStreamArg> for StreamKind {
    fn from(arg: FrameStreamArg) -> Self {
        match arg {
            FrameStreamArg::Stdin => StreamKind::Stdin,
            FrameStreamArg::Stdout => StreamKind::Stdout,
            FrameStreamArg::Stderr => StreamKind::Stderr,
        }
    }
}

#[derive(Args, Debug)]
pub struct FrameArgs {
    /// Read from a file instead of stdin.
    #[arg(long, short = 'i', value_name = "FILE")]
    pub input: Option<PathBuf>,
    /// Stream tag written into each header.
    #[arg(long, value_enum, default_value = "stdout")]
    pub stream: FrameStreamArg,
    /// Maximum payload bytes per frame.
    #[arg(long, default_value = "4096", value_parser = clap::value_parser!(u32).range(1..))]
    pub chunk: u32,
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    #[command(flatten)]
    pub env: EnvArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse durations like `500ms`, `90s`, `10m`, `1h`. A bare number is seconds.
pub fn parse_duration(input: &str) -> Result<std::time::Duration, String> {
    let input = input.trim();
    let split = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    let (number, unit) = input.split_at(split);
    let value: u64 = number
        .parse()
        .map_err(|_| format!("invalid duration '{input}'"))?;
    let millis = match unit {
        "ms" => value,
        "" | "s" => value.saturating_mul(1_000),
        "m" => value.saturating_mul(60_000),
        "h" => value.saturating_mul(3_600_000),
        _ => return Err(format!("invalid duration unit in '{input}'")),
    };
    Ok(std::time::Duration::from_millis(millis))
}
