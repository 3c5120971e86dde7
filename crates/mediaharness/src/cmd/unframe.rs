use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use mediaharness_frame::{demux, unframe_with, FrameReader};

use crate::cmd::{StreamArg, UnframeArgs};
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};
use crate::output::write_raw;

pub fn run(args: UnframeArgs) -> CliResult<i32> {
    if args.strict {
        return run_strict(&args);
    }

    let raw = read_input(args.input.as_deref())?;
    let out = match args.stream {
        StreamArg::All => unframe_with(&raw, args.mode),
        StreamArg::Stdout => demux(&raw).stdout,
        StreamArg::Stderr => demux(&raw).stderr,
    };
    tracing::debug!(input = raw.len(), output = out.len(), mode = %args.mode, "unframed");
    write_raw(&out).map_err(|err| io_error("write stdout", err))?;
    Ok(SUCCESS)
}

fn run_strict(args: &UnframeArgs) -> CliResult<i32> {
    let input: Box<dyn Read> = match args.input.as_deref() {
        Some(path) => Box::new(
            File::open(path).map_err(|err| io_error(&format!("read {}", path.display()), err))?,
        ),
        None => Box::new(io::stdin().lock()),
    };

    let mut stdout = io::stdout().lock();
    let mut frames = 0usize;
    for frame in FrameReader::new(input) {
        let frame = frame.map_err(|err| frame_error("unframe", err))?;
        frames += 1;
        if args.stream.keeps(frame.stream) {
            stdout
                .write_all(&frame.payload)
                .map_err(|err| io_error("write stdout", err))?;
        }
    }
    stdout.flush().map_err(|err| io_error("write stdout", err))?;

    tracing::debug!(frames, stream = ?args.stream, "unframed strictly");
    Ok(SUCCESS)
}

pub(crate) fn read_input(path: Option<&Path>) -> CliResult<Vec<u8>> {
    match path {
        Some(path) => {
            std::fs::read(path).map_err(|err| io_error(&format!("read {}", path.display()), err))
        }
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .lock()
                .read_to_end(&mut buf)
                .map_err(|err| io_error("read stdin", err))?;
            Ok(buf)
        }
    }
}
