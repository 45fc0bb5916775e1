// ABOUTME: Scoped raw mode for the local terminal.
// ABOUTME: The previous mode is restored on every exit path, including panics.

use crossterm::terminal;
use std::io;

/// Holds the local terminal in raw mode until restored or dropped.
pub struct RawTerminal {
    active: bool,
}

impl RawTerminal {
    /// Switch the controlling terminal to raw input mode.
    pub fn acquire() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self { active: true })
    }

    /// Restore the previous mode, reporting any failure.
    pub fn restore(mut self) -> io::Result<()> {
        self.active = false;
        terminal::disable_raw_mode()
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        if self.active {
            let _ = terminal::disable_raw_mode();
        }
    }
}

/// Width and height of the local terminal in character cells.
pub fn size() -> io::Result<(u16, u16)> {
    terminal::size()
}
