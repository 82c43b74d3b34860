//! Key bindings for the full-screen mode.

use crate::event::{Command, SessionEvent, Transport};
use crate::lyrics::Cycle;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Seconds added to or removed from the fix delay per key press.
pub const DELAY_STEP: f64 = 0.1;

/// Translate a terminal event into a session event, if it means anything.
pub fn map_event(event: &Event) -> Option<SessionEvent> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => map_key(key).map(SessionEvent::Command),
        Event::Resize(width, height) => Some(SessionEvent::Resized {
            width: *width,
            height: *height,
        }),
        _ => None,
    }
}

fn map_key(key: &KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return matches!(key.code, KeyCode::Char('c')).then_some(Command::Quit);
    }
    if key.modifiers.contains(KeyModifiers::ALT) {
        return None;
    }
    let command = match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Command::Quit,
        KeyCode::Char('r') => Command::Reload,
        KeyCode::Char(' ') => Command::Transport(Transport::PlayPause),
        KeyCode::Char(',') => Command::Transport(Transport::SkipPrevious),
        KeyCode::Char('.') => Command::Transport(Transport::SkipNext),
        KeyCode::Up => Command::CycleDocument(Cycle::Previous),
        KeyCode::Down => Command::CycleDocument(Cycle::Next),
        KeyCode::Char('+') | KeyCode::Char('=') => Command::ShiftDelay(DELAY_STEP),
        KeyCode::Char('-') => Command::ShiftDelay(-DELAY_STEP),
        _ => return None,
    };
    Some(command)
}
