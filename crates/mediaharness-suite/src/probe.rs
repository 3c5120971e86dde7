//! ffprobe and shaka-packager JSON output.

use std::collections::BTreeMap;

use mediaharness_engine::ContainerLogs;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SuiteError};

/// `ffprobe -print_format json -show_format -show_streams`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeOutput {
    #[serde(default)]
    pub format: ProbeFormat,
    #[serde(default)]
    pub streams: Vec<ProbeStream>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeFormat {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub format_name: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub bit_rate: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeStream {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub codec_name: String,
    #[serde(default)]
    pub codec_type: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub sample_rate: String,
    #[serde(default)]
    pub channels: u32,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub bit_rate: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl ProbeOutput {
    pub fn parse(json: &[u8]) -> Result<Self> {
        serde_json::from_slice(json).map_err(|e| SuiteError::Probe(e.to_string()))
    }

    /// Parse the JSON document ffprobe wrote to stdout. Diagnostics on
    /// stderr never reach the parser; stdout text before the first `{` is
    /// skipped.
    pub fn from_logs(logs: &ContainerLogs) -> Result<Self> {
        let stdout = logs.demux().stdout;
        match stdout.iter().position(|b| *b == b'{') {
            Some(start) => Self::parse(&stdout[start..]),
            None => Err(SuiteError::Probe(format!(
                "no JSON object in {} bytes of stdout",
                stdout.len()
            ))),
        }
    }

    pub fn video_streams(&self) -> impl Iterator<Item = &ProbeStream> {
        self.streams.iter().filter(|s| s.codec_type == "video")
    }

    pub fn audio_streams(&self) -> impl Iterator<Item = &ProbeStream> {
        self.streams.iter().filter(|s| s.codec_type == "audio")
    }

    /// Container duration in seconds, if reported.
    pub fn duration_secs(&self) -> Option<f64> {
        self.format.duration.parse().ok()
    }
}

/// One entry of shaka-packager's `--dump_stream_info` JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamInfo {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub codec: String,
    #[serde(default)]
    pub duration: String,
}

pub fn parse_stream_info(json: &[u8]) -> Result<Vec<StreamInfo>> {
    serde_json::from_slice(json).map_err(|e| SuiteError::Probe(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [
            {"index": 0, "codec_name": "h264", "codec_type": "video", "width": 1920, "height": 1080,
             "duration": "30.000000", "bit_rate": "4500000", "tags": {"language": "und"}},
            {"index": 1, "codec_name": "aac", "codec_type": "audio", "sample_rate": "48000",
             "channels": 2, "duration": "30.016000", "bit_rate": "128000"}
        ],
        "format": {
            "filename": "/input/sample.mp4",
            "nb_streams": 2,
            "format_name": "mov,mp4,m4a,3gp,3g2,mj2",
            "duration": "30.016000",
            "size": "17839845",
            "bit_rate": "4754778",
            "tags": {"major_brand": "isom"}
        }
    }"#;

    fn framed(tag: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![tag, 0, 0, 0];
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn parses_format_and_streams() {
        let probe = ProbeOutput::parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(probe.format.filename, "/input/sample.mp4");
        assert!(probe.format.format_name.contains("mov"));
        assert_eq!(probe.format.tags.get("major_brand").map(String::as_str), Some("isom"));
        assert_eq!(probe.duration_secs(), Some(30.016));

        let video: Vec<_> = probe.video_streams().collect();
        assert_eq!(video.len(), 1);
        assert_eq!((video[0].width, video[0].height), (1920, 1080));

        let audio: Vec<_> = probe.audio_streams().collect();
        assert_eq!(audio[0].channels, 2);
        assert_eq!(audio[0].width, 0);
    }

    #[test]
    fn parses_from_framed_logs() {
        let half = SAMPLE.len() / 2;
        let mut raw = framed(1, &SAMPLE.as_bytes()[..half]);
        raw.extend(framed(1, &SAMPLE.as_bytes()[half..]));
        let logs = ContainerLogs::from_raw(raw);

        let probe = ProbeOutput::from_logs(&logs).unwrap();
        assert_eq!(probe.streams.len(), 2);
    }

    #[test]
    fn skips_leading_banner() {
        let mut raw = framed(2, b"ffprobe version 8.0\n");
        raw.extend(framed(1, b"WARNING: legacy build\n"));
        raw.extend(framed(1, br#"{"format":{"format_name":"mov,mp4"}}"#));
        let logs = ContainerLogs::from_raw(raw);

        let probe = ProbeOutput::from_logs(&logs).unwrap();
        assert_eq!(probe.format.format_name, "mov,mp4");
        assert!(probe.streams.is_empty());
    }

    #[test]
    fn stderr_after_json_is_ignored() {
        let mut raw = framed(1, SAMPLE.as_bytes());
        raw.extend(framed(2, b"[mov,mp4 @ 0x55] stream 1, missing mandatory atoms\n"));
        let logs = ContainerLogs::from_raw(raw);

        let probe = ProbeOutput::from_logs(&logs).unwrap();
        assert_eq!(probe.streams.len(), 2);
        assert_eq!(probe.format.format_name, "mov,mp4,m4a,3gp,3g2,mj2");
    }

    #[test]
    fn non_json_output_is_probe_error() {
        let missing = framed(2, b"/input/sample.mp4: No such file or directory\n");
        let logs = ContainerLogs::from_raw(missing);
        assert!(matches!(ProbeOutput::from_logs(&logs), Err(SuiteError::Probe(_))));
        assert!(matches!(
            ProbeOutput::parse(b"{\"streams\": 3}"),
            Err(SuiteError::Probe(_))
        ));
    }

    #[test]
    fn stream_info_list() {
        let info = parse_stream_info(
            br#"[{"type":"video","codec":"avc1.64001f","duration":"10.0"},{"type":"audio","codec":"mp4a.40.2"}]"#,
        )
        .unwrap();
        assert_eq!(info.len(), 2);
        assert_eq!(info[0].kind, "video");
        assert_eq!(info[1].duration, "");
    }
}
