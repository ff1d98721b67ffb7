//! Raw, unbuffered key input.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;

/// Key that ends the session.
pub const QUIT_KEY: char = 'q';

/// A source of single key presses.
pub trait KeySource {
    /// Wait briefly for the next key. `Ok(None)` means nothing arrived in
    /// time, letting the caller re-check whether it should keep going.
    fn next_key(&mut self) -> io::Result<Option<char>>;
}

/// Reads key presses from the terminal. Requires raw mode for per-key delivery.
pub struct TerminalKeys {
    poll_interval: Duration,
}

impl TerminalKeys {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }
}

impl Default for TerminalKeys {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

impl KeySource for TerminalKeys {
    fn next_key(&mut self) -> io::Result<Option<char>> {
        if !event::poll(self.poll_interval)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) => Ok(key_char(key)),
            _ => Ok(None),
        }
    }
}

/// Raw mode swallows SIGINT, so Ctrl-C is folded into the quit key.
fn key_char(key: KeyEvent) -> Option<char> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(QUIT_KEY),
        KeyCode::Char(c) => Some(c),
        _ => None,
    }
}

/// Puts the terminal in raw mode and restores it when dropped.
pub struct RawModeGuard {
    _private: (),
}

impl RawModeGuard {
    pub fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self { _private: () })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            log::warn!("failed to restore terminal mode: {}", e);
        }
    }
}
