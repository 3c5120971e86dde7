use mediaharness_frame::{FrameConfig, FrameWriter, StreamKind};

use crate::cmd::unframe::read_input;
use crate::cmd::FrameArgs;
use crate::exit::{frame_error, CliResult, SUCCESS};

/// Wrap input in headers for one stream; useful for producing fixtures.
pub fn run(args: FrameArgs) -> CliResult<i32> {
    let data = read_input(args.input.as_deref())?;
    let stream = StreamKind::from(args.stream);
    let config = FrameConfig {
        max_payload_size: args.chunk as usize,
    };

    let mut writer = FrameWriter::with_config(std::io::stdout().lock(), config);
    let frames = writer
        .send_chunked(stream, &data)
        .map_err(|err| frame_error("write frames", err))?;
    tracing::debug!(frames, bytes = data.len(), stream = %stream, "framed");
    Ok(SUCCESS)
}
