//! Full-screen terminal mode.
//!
//! Painting is driven only by `RenderState` changes, from a single task.
//! Keyboard and resize events are read on a dedicated OS thread and forwarded
//! into the session's event queue.

use crate::event::SessionEvent;
use crate::text_utils::fit_width;
use crate::ui::input::map_event;
use crate::ui::styles::LyricStyles;
use crate::ui::view::{Geometry, PADDING, RenderState};
use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::Rect,
    style::Style,
    text::Line,
    widgets::{Block, Paragraph},
};
use std::io::{self, Stdout};
use std::thread;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::debug;

const INPUT_POLL: Duration = Duration::from_millis(100);

/// Owns the terminal while in full-screen mode. Restores it on drop.
pub struct Screen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    styles: LyricStyles,
}

impl Screen {
    /// Switch to raw mode and the alternate screen.
    pub fn enter(styles: LyricStyles) -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, Hide).inspect_err(|_| restore())?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout)).inspect_err(|_| restore())?;
        Ok(Self { terminal, styles })
    }

    /// Current terminal size.
    pub fn geometry(&self) -> io::Result<Geometry> {
        let (width, height) = crossterm::terminal::size()?;
        Ok(Geometry { width, height })
    }

    /// Repaint on every published change until the session ends.
    pub async fn paint_until_closed(&mut self, mut render: watch::Receiver<RenderState>) -> io::Result<()> {
        loop {
            let state = render.borrow_and_update().clone();
            let styles = &self.styles;
            self.terminal.draw(|f| draw(f, &state, styles))?;
            if render.changed().await.is_err() {
                return Ok(());
            }
        }
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        restore();
    }
}

/// Leave raw mode and the alternate screen. Safe to call when only part of
/// `Screen::enter` succeeded.
fn restore() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
}

/// Poll crossterm on a dedicated OS thread and forward mapped events.
/// The thread exits once the session stops receiving.
pub fn spawn_input_thread(events: mpsc::UnboundedSender<SessionEvent>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while !events.is_closed() {
            match crossterm::event::poll(INPUT_POLL) {
                Ok(true) => match crossterm::event::read() {
                    Ok(ev) => {
                        if let Some(event) = map_event(&ev)
                            && events.send(event).is_err()
                        {
                            break;
                        }
                    }
                    Err(e) => debug!(error = %e, "terminal read failed"),
                },
                Ok(false) => {}
                Err(e) => {
                    debug!(error = %e, "terminal poll failed");
                    thread::sleep(INPUT_POLL);
                }
            }
        }
    })
}

fn draw(f: &mut Frame, state: &RenderState, styles: &LyricStyles) {
    let area = f.area();
    if area.width == 0 || area.height == 0 {
        return;
    }

    draw_bar(f, area, 0, &state.top_bar, styles.bar);
    if area.height > 1 {
        draw_bar(f, area, area.height - 1, &state.bottom_bar, styles.bar);
    }

    let middle = state.middle_row();
    let first_previous = middle.saturating_sub(state.previous.len() as u16);
    for (i, text) in state.previous.iter().enumerate() {
        draw_line(f, area, first_previous + i as u16, text, styles.before);
    }
    if let Some(text) = &state.current {
        draw_line(f, area, middle, text, styles.current);
    }
    for (i, text) in state.next.iter().enumerate() {
        draw_line(f, area, middle + 1 + i as u16, text, styles.after);
    }
}

fn draw_bar(f: &mut Frame, area: Rect, row: u16, text: &str, style: Style) {
    let full = Rect { y: area.y + row, height: 1, ..area };
    f.render_widget(Block::default().style(style), full);
    draw_text(f, full, text, style);
}

/// Lyric rows never overlap the bars.
fn draw_line(f: &mut Frame, area: Rect, row: u16, text: &str, style: Style) {
    if row == 0 || row + 1 >= area.height {
        return;
    }
    let full = Rect { y: area.y + row, height: 1, ..area };
    draw_text(f, full, text, style);
}

fn draw_text(f: &mut Frame, row: Rect, text: &str, style: Style) {
    let pad = PADDING.min(row.width);
    let inner = Rect {
        x: row.x + pad,
        width: row.width - pad,
        ..row
    };
    if inner.width == 0 {
        return;
    }
    let text = fit_width(text, inner.width as usize);
    f.render_widget(Paragraph::new(Line::styled(text, style)), inner);
}
