// Utility functions for text formatting

use std::borrow::Cow;
use textwrap::core::display_width;
use unicode_segmentation::UnicodeSegmentation;

/// Clip `text` to `width` terminal cells, ending with an ellipsis when cut.
/// Never splits a grapheme cluster or a wide character.
pub fn fit_width(text: &str, width: usize) -> Cow<'_, str> {
    if display_width(text) <= width {
        return Cow::Borrowed(text);
    }
    if width == 0 {
        return Cow::Borrowed("");
    }
    let budget = width - 1;
    let mut used = 0;
    let mut clipped = String::with_capacity(text.len().min(width * 4));
    for grapheme in text.graphemes(true) {
        let w = display_width(grapheme);
        if used + w > budget {
            break;
        }
        used += w;
        clipped.push_str(grapheme);
    }
    clipped.push('…');
    Cow::Owned(clipped)
}
