//! The built-in scenarios, grouped by tool image.

use crate::check::{Check, ProbeExpectation};
use crate::config::Tool;
use crate::error::{Result, SuiteError};
use crate::scenario::{Input, ListLayout, Scenario, ToolRun};

const KIB: u64 = 1024;

/// Every scenario, in tool order.
pub fn all() -> Vec<Scenario> {
    Tool::ALL.into_iter().flat_map(for_tool).collect()
}

pub fn for_tool(tool: Tool) -> Vec<Scenario> {
    match tool {
        Tool::FfmpegLite => ffmpeg_lite(),
        Tool::FfmpegSplit => ffmpeg_split(),
        Tool::FfmpegConcat => ffmpeg_concat(),
        Tool::FfmpegThumbnail => ffmpeg_thumbnail(),
        Tool::Ffprobe => ffprobe(),
        Tool::ShakaPackager => shaka_packager(),
    }
}

/// Look up a scenario by full name (`tool/scenario`).
pub fn find(name: &str) -> Result<Scenario> {
    all()
        .into_iter()
        .find(|s| s.name == name)
        .ok_or_else(|| SuiteError::UnknownScenario(name.to_string()))
}

/// Resolve a selector: a full scenario name, or a tool name for all of its
/// scenarios.
pub fn select(selector: &str) -> Result<Vec<Scenario>> {
    if let Ok(tool) = selector.parse::<Tool>() {
        return Ok(for_tool(tool));
    }
    find(selector).map(|s| vec![s])
}

fn transcode<I, S>(
    tool: Tool,
    name: &str,
    description: &str,
    codec_args: I,
    output: &str,
    min_size: u64,
) -> Scenario
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Scenario::new(tool, name, description)
        .run(
            ToolRun::new(tool)
                .args(["-i", "/input/sample.mp4", "-t", "10"])
                .args(codec_args)
                .arg(format!("/output/{output}"))
                .sample()
                .output(),
        )
        .check(Check::file_exists(output))
        .check(Check::min_size(output, min_size))
}

fn h264(scale: &str, audio_bitrate: &str) -> Vec<String> {
    [
        "-vf",
        scale,
        "-c:v",
        "libx264",
        "-preset",
        "medium",
        "-crf",
        "23",
        "-c:a",
        "aac",
        "-b:a",
        audio_bitrate,
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn abr_rendition(scale: &str, bitrate: &str, output: &str) -> ToolRun {
    ToolRun::new(Tool::FfmpegLite)
        .args([
            "-i",
            "/input/sample.mp4",
            "-t",
            "10",
            "-vf",
            scale,
            "-c:v",
            "libx264",
            "-b:v",
            bitrate,
            "-preset",
            "medium",
            "-an",
        ])
        .arg(format!("/output/{output}"))
        .sample()
        .output()
}

fn ffmpeg_lite() -> Vec<Scenario> {
    let tool = Tool::FfmpegLite;
    vec![
        transcode(
            tool,
            "transcode-1080p-h264",
            "Scale to 1920x1080 H.264/AAC",
            h264("scale=1920:1080", "128k"),
            "output_1080p.mp4",
            100 * KIB,
        ),
        transcode(
            tool,
            "transcode-720p-h264",
            "Scale to 1280x720 H.264/AAC",
            h264("scale=1280:720", "128k"),
            "output_720p.mp4",
            50 * KIB,
        ),
        transcode(
            tool,
            "transcode-480p-h264",
            "Scale to 854x480 H.264/AAC",
            h264("scale=854:480", "96k"),
            "output_480p.mp4",
            30 * KIB,
        ),
        transcode(
            tool,
            "transcode-vp9-webm",
            "VP9/Opus WebM",
            ["-c:v", "libvpx-vp9", "-crf", "30", "-b:v", "0", "-c:a", "libopus", "-b:a", "128k"],
            "output.webm",
            50 * KIB,
        ),
        transcode(
            tool,
            "scale-custom-resolution",
            "Scale to 640x360 with audio copied",
            [
                "-vf", "scale=640:360", "-c:v", "libx264", "-preset", "fast", "-crf", "23",
                "-c:a", "copy",
            ],
            "scaled_640x360.mp4",
            20 * KIB,
        ),
        transcode(
            tool,
            "audio-aac-transcode",
            "Drop video and transcode audio to AAC",
            ["-vn", "-c:a", "aac", "-b:a", "192k"],
            "audio.mp4",
            10 * KIB,
        ),
        Scenario::new(tool, "multi-bitrate-abr", "720p and 480p video-only renditions")
            .run(abr_rendition("scale=1280:720", "2800k", "video_720p.mp4"))
            .run(abr_rendition("scale=854:480", "1400k", "video_480p.mp4"))
            .check(Check::file_exists("video_720p.mp4"))
            .check(Check::file_exists("video_480p.mp4"))
            .check(Check::LargerThan {
                larger: "video_720p.mp4".into(),
                smaller: "video_480p.mp4".into(),
            }),
    ]
}

fn segment_run(pattern: &str, seconds: &str) -> ToolRun {
    ToolRun::new(Tool::FfmpegSplit)
        .args([
            "-i",
            "/input/sample.mp4",
            "-t",
            "10",
            "-c",
            "copy",
            "-f",
            "segment",
            "-segment_time",
            seconds,
            "-reset_timestamps",
            "1",
        ])
        .arg(format!("/output/{pattern}"))
        .sample()
        .output()
}

fn scene_run(filter: &str, extra: &[&str]) -> ToolRun {
    ToolRun::new(Tool::FfmpegSplit)
        .args(["-i", "/input/sample.mp4", "-t", "10", "-vf", filter, "-vsync", "vfr"])
        .args(extra.iter().copied())
        .arg("/output/scene_%03d.mp4")
        .sample()
        .output()
}

fn ffmpeg_split() -> Vec<Scenario> {
    let tool = Tool::FfmpegSplit;
    vec![
        transcode(
            tool,
            "time-based-stream-copy",
            "Copy the first 10 seconds without re-encoding",
            ["-c", "copy"],
            "first-10s.mp4",
            100 * KIB,
        ),
        Scenario::new(tool, "segments-by-duration", "Split into 5 second segments")
            .run(segment_run("part-%03d.mp4", "5"))
            .check(Check::glob("part-*.mp4")),
        Scenario::new(tool, "scene-detection", "Keep frames past a 0.4 scene score")
            .run(scene_run("select='gt(scene,0.4)'", &[]))
            .check(Check::glob("scene_*.mp4")),
        Scenario::new(
            tool,
            "scene-detection-with-metadata",
            "Scene detection that also prints frame metadata to a file",
        )
        .run(scene_run(
            "select='gt(scene,0.4)',metadata=print:file=/output/scenes.txt",
            &[],
        ))
        .check(Check::file_exists("scenes.txt"))
        .check(Check::glob("scene_*.mp4")),
        Scenario::new(
            tool,
            "scene-detection-custom-threshold",
            "Scene detection at 0.3 with H.264 re-encode",
        )
        .run(scene_run(
            "select='gt(scene,0.3)'",
            &["-c:v", "libx264", "-preset", "fast", "-crf", "23"],
        ))
        .check(Check::glob("scene_*.mp4")),
    ]
}

fn concat_run(list: &str, output: &str) -> ToolRun {
    ToolRun::new(Tool::FfmpegConcat)
        .args(["-f", "concat", "-safe", "0", "-i"])
        .arg(format!("/workspace/{list}"))
        .args(["-c", "copy"])
        .arg(format!("/workspace/{output}"))
        .mount("/workspace")
}

fn ffmpeg_concat() -> Vec<Scenario> {
    let tool = Tool::FfmpegConcat;
    vec![
        Scenario::new(tool, "mp4-files", "Split into segments, then join them back")
            .run(segment_run("part-%03d.mp4", "5"))
            .check(Check::glob("part-*.mp4"))
            .concat_list("list.txt", "part-*.mp4", ListLayout::Plain)
            .run(concat_run("list.txt", "concatenated.mp4"))
            .check(Check::file_exists("concatenated.mp4"))
            .check(Check::min_size("concatenated.mp4", 100 * KIB)),
        Scenario::new(tool, "with-duration-metadata", "Concat list with duration directives")
            .run(segment_run("clip-%03d.mp4", "3"))
            .concat_list("list.txt", "clip-*.mp4", ListLayout::Duration(15.0))
            .run(concat_run("list.txt", "output.mp4"))
            .check(Check::file_exists("output.mp4")),
        Scenario::new(tool, "with-trim-points", "Concat list with inpoint/outpoint directives")
            .run(segment_run("segment-%03d.mp4", "5"))
            .concat_list(
                "trimlist.txt",
                "segment-*.mp4",
                ListLayout::Trim(vec![(5.0, 15.0), (0.0, 10.0)]),
            )
            .run(concat_run("trimlist.txt", "trimmed.mp4"))
            .check(Check::file_exists("trimmed.mp4")),
        Scenario::new(tool, "webm-files", "Concatenate WebM inputs")
            .skipped("requires pre-existing WebM inputs"),
    ]
}

fn thumbnail(name: &str, description: &str, args: &[&str], output: &str, min: u64) -> Scenario {
    let tool = Tool::FfmpegThumbnail;
    Scenario::new(tool, name, description)
        .run(
            ToolRun::new(tool)
                .args(["-i", "/input/sample.mp4"])
                .args(args.iter().copied())
                .arg(format!("/output/{output}"))
                .sample()
                .output(),
        )
        .check(Check::file_exists(output))
        .check(Check::min_size(output, min))
}

fn ffmpeg_thumbnail() -> Vec<Scenario> {
    let tool = Tool::FfmpegThumbnail;
    vec![
        thumbnail(
            "png-generation",
            "Single PNG frame at 5 seconds",
            &["-ss", "5", "-vframes", "1"],
            "thumbnail.png",
            KIB,
        ),
        thumbnail(
            "jpeg-generation",
            "Single JPEG frame at 10 seconds",
            &["-ss", "10", "-vframes", "1"],
            "thumbnail.jpg",
            KIB,
        ),
        thumbnail(
            "storyboard-5x5",
            "5x5 tile grid of scaled frames",
            &["-t", "10", "-vf", "fps=1/10,scale=160:90,tile=5x5"],
            "storyboard.jpg",
            10 * KIB,
        ),
        thumbnail(
            "best-frame",
            "Representative frame chosen by the thumbnail filter",
            &["-t", "10", "-vf", "thumbnail", "-frames:v", "1"],
            "best-frame.jpg",
            KIB,
        ),
        Scenario::new(tool, "multiple-at-intervals", "One thumbnail per interval")
            .run(
                ToolRun::new(tool)
                    .args(["-i", "/input/sample.mp4", "-t", "10", "-vf", "fps=1/60"])
                    .arg("/output/thumb-%04d.jpg")
                    .sample()
                    .output(),
            )
            .check(Check::glob("thumb-*.jpg")),
    ]
}

fn probe_run(show: &[&str]) -> ToolRun {
    ToolRun::new(Tool::Ffprobe)
        .args(["-v", "quiet", "-print_format", "json"])
        .args(show.iter().copied())
        .arg("/input/sample.mp4")
        .sample()
}

fn ffprobe() -> Vec<Scenario> {
    let tool = Tool::Ffprobe;
    vec![
        Scenario::new(tool, "basic-info", "Format and stream summary as JSON")
            .run(probe_run(&["-show_format", "-show_streams"]))
            .check(Check::Probe(ProbeExpectation::BasicInfo)),
        Scenario::new(tool, "json-output", "Format section names the MP4 family")
            .run(probe_run(&["-show_format"]))
            .check(Check::Probe(ProbeExpectation::FormatNameContains("mov".into()))),
        Scenario::new(tool, "stream-info", "Video stream has codec and dimensions")
            .run(probe_run(&["-show_streams"]))
            .check(Check::Probe(ProbeExpectation::HasVideoStream)),
    ]
}

fn packager_run(args: &[&str]) -> ToolRun {
    ToolRun::new(Tool::ShakaPackager)
        .args(args.iter().copied())
        .sample()
        .output()
}

const AUDIO_STREAM: &str = "in=/input/sample.mp4,stream=audio,output=/output/audio.mp4";
const VIDEO_STREAM: &str = "in=/input/sample.mp4,stream=video,output=/output/video.mp4";

fn dash_outputs() -> Vec<Check> {
    vec![
        Check::file_exists("audio.mp4"),
        Check::file_exists("video.mp4"),
        Check::file_exists("manifest.mpd"),
    ]
}

fn ffmpeg_rendition(scale: &str, bitrate: &str, output: &str) -> ToolRun {
    ToolRun::new(Tool::FfmpegLite)
        .args([
            "-i",
            "/input/sample.mp4",
            "-t",
            "10",
            "-vf",
            scale,
            "-c:v",
            "libx264",
            "-b:v",
            bitrate,
            "-c:a",
            "aac",
            "-b:a",
            "128k",
        ])
        .arg(format!("/output/{output}"))
        .sample()
        .output()
}

fn shaka_packager() -> Vec<Scenario> {
    let tool = Tool::ShakaPackager;
    vec![
        Scenario::new(tool, "basic-dash", "Separate audio and video with a DASH manifest")
            .run(packager_run(&[
                AUDIO_STREAM,
                VIDEO_STREAM,
                "--mpd_output",
                "/output/manifest.mpd",
            ]))
            .checks(dash_outputs())
            .checks([
                Check::contains("manifest.mpd", "MPD"),
                Check::contains("manifest.mpd", "AdaptationSet"),
                Check::contains("manifest.mpd", "audio.mp4"),
                Check::contains("manifest.mpd", "video.mp4"),
            ]),
        Scenario::new(tool, "hls", "Audio and video playlists under a master playlist")
            .run(packager_run(&[
                "in=/input/sample.mp4,stream=audio,output=/output/audio.m4a,playlist_name=audio.m3u8",
                "in=/input/sample.mp4,stream=video,output=/output/video.mp4,playlist_name=video.m3u8",
                "--hls_master_playlist_output",
                "/output/master.m3u8",
            ]))
            .checks([
                Check::file_exists("audio.m4a"),
                Check::file_exists("video.mp4"),
                Check::file_exists("audio.m3u8"),
                Check::file_exists("video.m3u8"),
                Check::file_exists("master.m3u8"),
                Check::contains("master.m3u8", "#EXTM3U"),
                Check::contains("master.m3u8", "audio.m3u8"),
                Check::contains("master.m3u8", "video.m3u8"),
            ]),
        Scenario::new(
            tool,
            "multi-bitrate-dash",
            "Package two ffmpeg renditions plus audio into one manifest",
        )
        .run(ffmpeg_rendition("scale=1280:720", "2500k", "video_720p.mp4"))
        .run(ffmpeg_rendition("scale=854:480", "1200k", "video_480p.mp4"))
        .checks([
            Check::file_exists("video_720p.mp4"),
            Check::file_exists("video_480p.mp4"),
        ])
        .run(
            packager_run(&[
                "in=/input/video_720p.mp4,stream=video,output=/output/dash_720p.mp4",
                "in=/input/video_480p.mp4,stream=video,output=/output/dash_480p.mp4",
                "in=/input/sample.mp4,stream=audio,output=/output/dash_audio.mp4",
                "--mpd_output",
                "/output/manifest.mpd",
            ])
            .input(Input::Workspace("video_720p.mp4".into()), "/input/video_720p.mp4")
            .input(Input::Workspace("video_480p.mp4".into()), "/input/video_480p.mp4"),
        )
        .checks([
            Check::file_exists("dash_720p.mp4"),
            Check::file_exists("dash_480p.mp4"),
            Check::file_exists("dash_audio.mp4"),
            Check::file_exists("manifest.mpd"),
            Check::contains("manifest.mpd", "dash_720p.mp4"),
            Check::contains("manifest.mpd", "dash_480p.mp4"),
            Check::contains("manifest.mpd", "dash_audio.mp4"),
            Check::CountAtLeast {
                file: "manifest.mpd".into(),
                needle: "<AdaptationSet".into(),
                min: 2,
            },
        ]),
        Scenario::new(tool, "fragmented-mp4", "Fragmented outputs with 2 second fragments")
            .run(packager_run(&[
                "in=/input/sample.mp4,stream=audio,output=/output/audio_frag.mp4",
                "in=/input/sample.mp4,stream=video,output=/output/video_frag.mp4",
                "--fragment_duration",
                "2",
            ]))
            .checks([
                Check::file_exists("audio_frag.mp4"),
                Check::file_exists("video_frag.mp4"),
                Check::size_above("audio_frag.mp4", KIB),
                Check::size_above("video_frag.mp4", KIB),
            ]),
        Scenario::new(tool, "static-live-mpd", "Static MPD using the live profile")
            .run(packager_run(&[
                AUDIO_STREAM,
                VIDEO_STREAM,
                "--mpd_output",
                "/output/manifest.mpd",
                "--generate_static_live_mpd",
            ]))
            .checks([
                Check::file_exists("manifest.mpd"),
                Check::contains("manifest.mpd", "MPD"),
                Check::NonEmpty("manifest.mpd".into()),
            ]),
        Scenario::new(tool, "segment-duration", "DASH with 4 second segments")
            .run(packager_run(&[
                AUDIO_STREAM,
                VIDEO_STREAM,
                "--mpd_output",
                "/output/manifest.mpd",
                "--segment_duration",
                "4",
            ]))
            .checks(dash_outputs())
            .check(Check::contains("manifest.mpd", "Duration")),
        Scenario::new(tool, "stream-info", "Stream details dumped to the logs")
            .run(packager_run(&[
                AUDIO_STREAM,
                VIDEO_STREAM,
                "--mpd_output",
                "/output/manifest.mpd",
                "--dump_stream_info",
            ]))
            .check(Check::LogsContain("Stream".into()))
            .checks(dash_outputs()),
        Scenario::new(tool, "video-only", "Video stream alone yields one adaptation set")
            .run(packager_run(&[
                "in=/input/sample.mp4,stream=video,output=/output/video_only.mp4",
                "--mpd_output",
                "/output/manifest.mpd",
            ]))
            .checks([
                Check::file_exists("video_only.mp4"),
                Check::file_exists("manifest.mpd"),
                Check::contains("manifest.mpd", "video_only.mp4"),
                Check::CountEquals {
                    file: "manifest.mpd".into(),
                    needle: "<AdaptationSet".into(),
                    count: 1,
                },
            ]),
    ]
}
