mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "mediaharness", version, about = "Containerized media tool harness")]
struct Cli {
    /// Output format. Default: table on a terminal, json otherwise.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        env = "MEDIAHARNESS_LOG_LEVEL",
        default_value = "info",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    match cmd::run(cli.command, format) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use mediaharness_frame::DemuxMode;

    use super::*;
    use crate::cmd::{PullArg, StreamArg};

    #[test]
    fn parses_run_with_selectors() {
        let cli = Cli::try_parse_from([
            "mediaharness",
            "run",
            "ffprobe",
            "shaka-packager/hls",
            "--mode",
            "heuristic",
            "--pull",
            "never",
            "--keep",
        ])
        .expect("run args should parse");

        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.selectors, vec!["ffprobe", "shaka-packager/hls"]);
        assert_eq!(args.mode, DemuxMode::Heuristic);
        assert_eq!(args.pull, PullArg::Never);
        assert!(args.keep);
    }

    #[test]
    fn parses_tool_list() {
        let cli = Cli::try_parse_from(["mediaharness", "list", "--tool", "ffprobe,ffmpeg-split"])
            .expect("list args should parse");
        let Command::List(args) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.tool.len(), 2);
    }

    #[test]
    fn rejects_unknown_mode() {
        let err = Cli::try_parse_from(["mediaharness", "unframe", "--mode", "guess"])
            .expect_err("unknown mode should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn unframe_defaults() {
        let cli = Cli::try_parse_from(["mediaharness", "unframe"]).expect("unframe should parse");
        let Command::Unframe(args) = cli.command else {
            panic!("expected unframe");
        };
        assert_eq!(args.mode, DemuxMode::LengthPrefixed);
        assert_eq!(args.stream, StreamArg::All);
        assert!(args.input.is_none());
        assert!(!args.strict);
    }

    #[test]
    fn rejects_zero_chunk() {
        let err = Cli::try_parse_from(["mediaharness", "frame", "--chunk", "0"])
            .expect_err("zero chunk should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
