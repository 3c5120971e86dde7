//! Input lists for ffmpeg's concat demuxer.

use std::fmt::Write as _;

/// One `file` directive with its optional per-file options.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcatEntry {
    pub file: String,
    pub duration: Option<f64>,
    pub inpoint: Option<f64>,
    pub outpoint: Option<f64>,
}

impl ConcatEntry {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            duration: None,
            inpoint: None,
            outpoint: None,
        }
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    pub fn with_trim(mut self, inpoint: f64, outpoint: f64) -> Self {
        self.inpoint = Some(inpoint);
        self.outpoint = Some(outpoint);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConcatList {
    entries: Vec<ConcatEntry>,
}

impl ConcatList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ConcatEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ConcatEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the list in concat demuxer syntax, one directive per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            let _ = writeln!(out, "file '{}'", quote(&entry.file));
            if let Some(duration) = entry.duration {
                let _ = writeln!(out, "duration {duration:.1}");
            }
            if let Some(inpoint) = entry.inpoint {
                let _ = writeln!(out, "inpoint {inpoint:.1}");
            }
            if let Some(outpoint) = entry.outpoint {
                let _ = writeln!(out, "outpoint {outpoint:.1}");
            }
        }
        out
    }
}

impl FromIterator<ConcatEntry> for ConcatList {
    fn from_iter<I: IntoIterator<Item = ConcatEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Escape a single-quoted path: `'` becomes `'\''`.
fn quote(path: &str) -> String {
    path.replace('\'', r"'\''")
}
