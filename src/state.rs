// state.rs: State data structures for playback and highlighting

use crate::lyrics::LyricsDocument;

/// What the player last reported: position in seconds and whether it is playing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlaybackSnapshot {
    pub time: f64,
    pub is_playing: bool,
}

impl PlaybackSnapshot {
    pub fn new(time: f64, is_playing: bool) -> Self {
        Self { time, is_playing }
    }

    pub fn playing(time: f64) -> Self {
        Self::new(time, true)
    }

    pub fn paused(time: f64) -> Self {
        Self::new(time, false)
    }
}

/// The single mutable aggregate owned by the session coordinator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HighlightState {
    pub document: Option<LyricsDocument>,
    /// Active line within `document`; `None` before the first line starts.
    pub line: Option<usize>,
    pub playback: PlaybackSnapshot,
}

impl HighlightState {
    /// Drop the document and its highlight, keeping playback.
    pub fn clear_document(&mut self) {
        self.document = None;
        self.line = None;
    }

    pub fn select(&mut self, document: LyricsDocument) {
        self.document = Some(document);
        self.line = None;
    }

    /// Returns true when the stored line changed.
    pub fn update_line(&mut self, line: Option<usize>) -> bool {
        if self.line != line {
            self.line = line;
            true
        } else {
            false
        }
    }
}
