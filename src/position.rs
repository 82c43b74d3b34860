//! Mapping a playback offset onto a line index.

use crate::lyrics::LyricLine;

/// Index of the first line starting strictly after `offset`, or `lines.len()`
/// when every line has already started.
///
/// `lines` must be sorted by start time. A NaN offset is treated as being
/// before every line.
pub fn index_at(offset: f64, lines: &[LyricLine]) -> usize {
    lines.partition_point(|line| line.time <= offset)
}

/// The line active at `offset`: the last one whose start is `<= offset`.
/// `None` before the first line starts.
pub fn active_line(offset: f64, lines: &[LyricLine]) -> Option<usize> {
    index_at(offset, lines).checked_sub(1)
}
