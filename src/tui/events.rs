use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use std::io;
use std::time::Duration;

/// User intent read from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// Cancel any running session and leave.
    Quit,
    /// Cancel the running session but stay on screen.
    Cancel,
    /// Start a new session if none is running.
    Restart,
    Tick,
}

/// Map a key press to an intent; other keys are ignored.
pub fn map_key(key: KeyEvent) -> Option<AppEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(AppEvent::Quit),
        KeyCode::Char('c') | KeyCode::Char('C') => Some(AppEvent::Cancel),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(AppEvent::Restart),
        _ => None,
    }
}

/// Wait up to `timeout` for a key; `Tick` if none arrived.
pub fn next_event(timeout: Duration) -> io::Result<Option<AppEvent>> {
    if event::poll(timeout)? {
        match event::read()? {
            Event::Key(key) => Ok(map_key(key)),
            _ => Ok(None),
        }
    } else {
        Ok(Some(AppEvent::Tick))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, KeyModifiers};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(map_key(press(KeyCode::Char('q'))), Some(AppEvent::Quit));
        assert_eq!(map_key(press(KeyCode::Esc)), Some(AppEvent::Quit));
        assert_eq!(map_key(press(KeyCode::Char('c'))), Some(AppEvent::Cancel));
        assert_eq!(map_key(press(KeyCode::Char('r'))), Some(AppEvent::Restart));
        assert_eq!(map_key(press(KeyCode::Char('x'))), None);
    }

    #[test]
    fn test_release_is_ignored() {
        let release = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(map_key(release), None);
    }
}
