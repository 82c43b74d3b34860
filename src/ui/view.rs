//! Display-ready projection of the session state.
//!
//! `RenderState` is recomputed after every mutation and compared with the
//! last published one; renderers only see it when something visible changed.

use crate::lyrics::LyricLine;
use crate::mpris::TrackMetadata;
use crate::state::HighlightState;
use std::sync::Arc;

/// Blank cells kept between the screen edge and any text.
pub const PADDING: u16 = 2;
const NO_CONTENT: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u16,
    pub height: u16,
}

impl Default for Geometry {
    fn default() -> Self {
        Self { width: 80, height: 24 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayStatus {
    Playing,
    Paused,
    #[default]
    Stopped,
}

impl PlayStatus {
    pub fn label(self) -> &'static str {
        match self {
            PlayStatus::Playing => "Playing",
            PlayStatus::Paused => "Paused",
            PlayStatus::Stopped => "Stopped",
        }
    }
}

/// Everything the coordinator knows that is visible on screen.
pub struct Projection<'a> {
    pub highlight: &'a HighlightState,
    pub track: Option<&'a TrackMetadata>,
    pub document_index: usize,
    pub document_count: usize,
    pub reloading: bool,
    pub fix_delay: f64,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderState {
    pub geometry: Geometry,
    pub status: PlayStatus,
    pub top_bar: String,
    pub bottom_bar: String,
    /// Source label with position, e.g. `lrclib (1/3)`. `None` without a document.
    pub source: Option<String>,
    /// Active line index in the current document.
    pub line: Option<usize>,
    /// Lines above the active one, top to bottom, as many as fit.
    pub previous: Vec<String>,
    pub current: Option<String>,
    /// Lines below the active one, as many as fit.
    pub next: Vec<String>,
    /// Every line of the selected document, shared with it.
    pub lines: Option<Arc<Vec<LyricLine>>>,
}

impl RenderState {
    pub fn project(p: &Projection<'_>) -> Self {
        let status = match p.track {
            None => PlayStatus::Stopped,
            Some(_) if p.highlight.playback.is_playing => PlayStatus::Playing,
            Some(_) => PlayStatus::Paused,
        };

        let source = p.highlight.document.as_ref().map(|doc| {
            format!("{} ({}/{})", doc.source, p.document_index + 1, p.document_count.max(1))
        });

        let mut bottom_bar = format!(
            "State: {} | Lyric Source: {}",
            status.label(),
            if p.reloading {
                "Reloading..."
            } else {
                source.as_deref().unwrap_or(NO_CONTENT)
            }
        );
        if p.fix_delay.abs() >= 0.005 {
            bottom_bar.push_str(&format!(" | Delay: {:+.2}s", p.fix_delay));
        }

        let (previous, current, next) = windows(p.highlight, p.geometry);

        Self {
            geometry: p.geometry,
            status,
            top_bar: top_bar(p.track),
            bottom_bar,
            source,
            line: p.highlight.line,
            previous,
            current,
            next,
            lines: p.highlight.document.as_ref().map(|doc| Arc::clone(&doc.lines)),
        }
    }

    /// Row of the active line; previous lines sit above, next lines below.
    pub fn middle_row(&self) -> u16 {
        self.geometry.height / 2
    }
}

fn top_bar(track: Option<&TrackMetadata>) -> String {
    let Some(track) = track else {
        return format!("Title: {NO_CONTENT} | Artist: {NO_CONTENT} | Album: {NO_CONTENT}");
    };
    let mut bar = format!("Title: {}", track.title);
    if let Some(artist) = &track.artist {
        bar.push_str(&format!(" | Artist: {artist}"));
    }
    if let Some(album) = &track.album {
        bar.push_str(&format!(" | Album: {album}"));
    }
    bar
}

fn windows(highlight: &HighlightState, geometry: Geometry) -> (Vec<String>, Option<String>, Vec<String>) {
    let Some(doc) = &highlight.document else {
        return (Vec::new(), None, Vec::new());
    };
    let lines = doc.lines.as_slice();
    let middle = geometry.height / 2;
    let above = middle.saturating_sub(PADDING) as usize;
    let below = geometry.height.saturating_sub(PADDING).saturating_sub(middle + 1) as usize;

    // Before the first line nothing is active and every line is upcoming.
    let (before, current, after) = match highlight.line {
        Some(i) if i < lines.len() => (&lines[..i], Some(&lines[i]), &lines[i + 1..]),
        Some(_) => (lines, None, &lines[lines.len()..]),
        None => (&lines[..0], None, lines),
    };

    let skip = before.len().saturating_sub(above);
    let previous = before[skip..].iter().map(|l| l.text.clone()).collect();
    let next = after.iter().take(below).map(|l| l.text.clone()).collect();
    (previous, current.map(|l| l.text.clone()), next)
}
