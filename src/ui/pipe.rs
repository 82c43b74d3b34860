use crate::lyrics::LyricLine;
use crate::ui::view::{PlayStatus, RenderState};
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::watch;

/// Turns successive render states into stdout lines: a header per track,
/// the source label per selected document, then the lyric text.
///
/// Every line up to the active one is printed exactly once per pass through
/// the document. Joining mid-song or seeking forward prints the lines in
/// between; seeking backward prints the document again from its start.
#[derive(Debug, Default)]
pub struct PipePrinter {
    track: Option<String>,
    source: Option<String>,
    lines: Option<Arc<Vec<LyricLine>>>,
    printed: Option<usize>,
}

impl PipePrinter {
    pub fn feed(&mut self, state: &RenderState) -> Vec<String> {
        let mut out = Vec::new();

        let track = (state.status != PlayStatus::Stopped).then(|| state.top_bar.clone());
        if track != self.track {
            if let Some(header) = &track {
                out.push(header.clone());
            }
            self.track = track;
            self.source = None;
            self.lines = None;
            self.printed = None;
        }

        if state.source != self.source {
            if let Some(source) = &state.source {
                out.push(format!("[{source}]"));
            }
            self.source = state.source.clone();
            self.printed = None;
        }

        let same_document = match (&self.lines, &state.lines) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if !same_document {
            self.lines = state.lines.clone();
            self.printed = None;
        }

        let (Some(active), Some(lines)) = (state.line, &state.lines) else {
            if state.line.is_none() {
                self.printed = None;
            }
            return out;
        };
        let from = match self.printed {
            Some(last) if active == last => return out,
            Some(last) if active > last => last + 1,
            _ => 0,
        };
        if let Some(pending) = lines.get(from..=active) {
            out.extend(pending.iter().map(|l| l.text.clone()));
        }
        self.printed = Some(active);
        out
    }
}

/// Print until the session ends.
pub async fn run(mut render: watch::Receiver<RenderState>) -> io::Result<()> {
    let mut printer = PipePrinter::default();
    let mut stdout = io::stdout();
    loop {
        let lines = printer.feed(&render.borrow_and_update());
        for line in lines {
            writeln!(stdout, "{line}")?;
        }
        stdout.flush()?;
        if render.changed().await.is_err() {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lyrics(texts: &[&str]) -> Arc<Vec<LyricLine>> {
        Arc::new(
            texts
                .iter()
                .enumerate()
                .map(|(i, t)| LyricLine::new(i as f64, *t))
                .collect(),
        )
    }

    fn state(
        top: &str,
        source: Option<&str>,
        lines: Option<&Arc<Vec<LyricLine>>>,
        line: Option<usize>,
    ) -> RenderState {
        RenderState {
            status: PlayStatus::Playing,
            top_bar: top.into(),
            source: source.map(str::to_string),
            line,
            current: line.and_then(|i| lines.and_then(|l| l.get(i)).map(|l| l.text.clone())),
            lines: lines.cloned(),
            ..Default::default()
        }
    }

    #[test]
    fn test_prints_header_source_and_new_lines() {
        let doc = lyrics(&["first", "second"]);
        let mut p = PipePrinter::default();
        assert_eq!(p.feed(&state("Title: A", None, None, None)), vec!["Title: A"]);
        assert_eq!(
            p.feed(&state("Title: A", Some("lrclib (1/2)"), Some(&doc), Some(0))),
            vec!["[lrclib (1/2)]", "first"]
        );
        // Same line again, e.g. a pause: nothing new.
        assert!(p.feed(&state("Title: A", Some("lrclib (1/2)"), Some(&doc), Some(0))).is_empty());
        assert_eq!(
            p.feed(&state("Title: A", Some("lrclib (1/2)"), Some(&doc), Some(1))),
            vec!["second"]
        );
    }

    #[test]
    fn test_joining_mid_song_prints_every_line_so_far() {
        let doc = lyrics(&["first", "second", "third", "fourth"]);
        let mut p = PipePrinter::default();
        assert_eq!(
            p.feed(&state("Title: A", Some("lrclib (1/1)"), Some(&doc), Some(2))),
            vec!["Title: A", "[lrclib (1/1)]", "first", "second", "third"]
        );
    }

    #[test]
    fn test_forward_jump_prints_skipped_lines() {
        let doc = lyrics(&["l0", "l1", "l2", "l3", "l4", "l5", "l6"]);
        let mut p = PipePrinter::default();
        p.feed(&state("Title: A", Some("lrclib (1/1)"), Some(&doc), Some(2)));
        assert_eq!(
            p.feed(&state("Title: A", Some("lrclib (1/1)"), Some(&doc), Some(5))),
            vec!["l3", "l4", "l5"]
        );
    }

    #[test]
    fn test_backward_seek_prints_from_start() {
        let doc = lyrics(&["l0", "l1", "l2", "l3"]);
        let mut p = PipePrinter::default();
        p.feed(&state("Title: A", Some("lrclib (1/1)"), Some(&doc), Some(3)));
        assert_eq!(
            p.feed(&state("Title: A", Some("lrclib (1/1)"), Some(&doc), Some(1))),
            vec!["l0", "l1"]
        );
        // Before the first line: nothing printed, the next line starts over.
        assert!(p.feed(&state("Title: A", Some("lrclib (1/1)"), Some(&doc), None)).is_empty());
        assert_eq!(
            p.feed(&state("Title: A", Some("lrclib (1/1)"), Some(&doc), Some(0))),
            vec!["l0"]
        );
    }

    #[test]
    fn test_document_switch_prints_new_document_up_to_active_line() {
        let a = lyrics(&["a0", "a1", "a2"]);
        let b = lyrics(&["b0", "b1", "b2"]);
        let mut p = PipePrinter::default();
        p.feed(&state("Title: A", Some("lrclib (1/2)"), Some(&a), Some(1)));
        assert_eq!(
            p.feed(&state("Title: A", Some("lrclib (2/2)"), Some(&b), Some(1))),
            vec!["[lrclib (2/2)]", "b0", "b1"]
        );
    }

    #[test]
    fn test_reloaded_document_with_same_label_is_printed_again() {
        let old = lyrics(&["x0", "x1"]);
        let fresh = lyrics(&["y0", "y1"]);
        let mut p = PipePrinter::default();
        p.feed(&state("Title: A", Some("lrclib (1/1)"), Some(&old), Some(1)));
        assert_eq!(
            p.feed(&state("Title: A", Some("lrclib (1/1)"), Some(&fresh), Some(1))),
            vec!["y0", "y1"]
        );
    }

    #[test]
    fn test_stopped_prints_nothing() {
        let mut p = PipePrinter::default();
        assert!(p.feed(&RenderState::default()).is_empty());
    }
}
