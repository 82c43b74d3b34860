use std::sync::Arc;
use thiserror::Error;

/// One timestamped line of lyric text. `time` is the start offset in seconds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LyricLine {
    pub time: f64,
    pub text: String,
}

impl LyricLine {
    pub fn new(time: f64, text: impl Into<String>) -> Self {
        Self { time, text: text.into() }
    }
}

/// A complete set of lines for a track from one source, with a match quality.
///
/// Immutable once built; cloning shares the line buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct LyricsDocument {
    pub lines: Arc<Vec<LyricLine>>,
    pub quality: f64,
    pub source: String,
}

impl LyricsDocument {
    /// Builds a document, dropping lines with non-finite start times and
    /// sorting the rest stably by start time.
    pub fn new(mut lines: Vec<LyricLine>, quality: f64, source: impl Into<String>) -> Self {
        lines.retain(|l| l.time.is_finite());
        lines.sort_by(|a, b| a.time.total_cmp(&b.time));
        let quality = if quality.is_nan() { 0.0 } else { quality };
        Self {
            lines: Arc::new(lines),
            quality,
            source: source.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Direction for cycling through candidate documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    Next,
    Previous,
}

/// All documents fetched for the current track, best quality first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateSet {
    docs: Vec<LyricsDocument>,
}

impl CandidateSet {
    /// Ranks documents by quality, descending. `sort_by` is stable, so equal
    /// qualities keep the order in which they were collected.
    pub fn ranked(mut docs: Vec<LyricsDocument>) -> Self {
        docs.sort_by(|a, b| b.quality.total_cmp(&a.quality));
        Self { docs }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LyricsDocument> {
        self.docs.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LyricsDocument> {
        self.docs.iter()
    }

    /// Index reached by stepping once from `from`, wrapping in both
    /// directions. `None` when the set is empty.
    pub fn cycle(&self, from: usize, direction: Cycle) -> Option<usize> {
        let len = self.docs.len();
        if len == 0 {
            return None;
        }
        let from = from.min(len - 1);
        Some(match direction {
            Cycle::Next => (from + 1) % len,
            Cycle::Previous => (from + len - 1) % len,
        })
    }
}

#[derive(Error, Debug)]
pub enum LyricsError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("API error: {0}")]
    Api(String),
    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}
