use ratatui::style::{Color, Modifier, Style};

/// Palette accepted by `--color`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum HighlightColor {
    Black,
    White,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    #[default]
    Cyan,
}

impl From<HighlightColor> for Color {
    fn from(c: HighlightColor) -> Self {
        match c {
            HighlightColor::Black => Color::Black,
            HighlightColor::White => Color::White,
            HighlightColor::Red => Color::Red,
            HighlightColor::Green => Color::Green,
            HighlightColor::Yellow => Color::Yellow,
            HighlightColor::Blue => Color::Blue,
            HighlightColor::Magenta => Color::Magenta,
            HighlightColor::Cyan => Color::Cyan,
        }
    }
}

pub struct LyricStyles {
    pub before: Style,
    pub current: Style,
    pub after: Style,
    /// Top and bottom status bars.
    pub bar: Style,
}

impl LyricStyles {
    pub fn new(color: HighlightColor, bold: bool) -> Self {
        let mut current = Style::default().fg(color.into());
        if bold {
            current = current.add_modifier(Modifier::BOLD);
        }
        Self {
            before: Style::default().add_modifier(Modifier::DIM),
            current,
            after: Style::default(),
            bar: Style::default().fg(Color::Black).bg(Color::White),
        }
    }
}

impl Default for LyricStyles {
    fn default() -> Self {
        Self::new(HighlightColor::default(), true)
    }
}
