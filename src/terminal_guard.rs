//! Scoped ownership of the terminal mode.
//!
//! [`TerminalSession`] puts the terminal into raw mode on the alternate screen
//! and restores it when dropped. [`SuspendedTerminal`] does the opposite for
//! the lifetime of a child process, so the child gets a normal terminal and
//! the reader gets its screen back however the child exits.

use std::io::{self, Write};

use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::warn;

fn acquire() -> io::Result<()> {
    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen, Hide)
}

/// Leave raw mode and the alternate screen, ignoring failures.
pub fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
    let _ = io::stdout().flush();
}

pub struct TerminalSession {
    _private: (),
}

impl TerminalSession {
    pub fn enter() -> io::Result<Self> {
        if let Err(e) = acquire() {
            restore_terminal();
            return Err(e);
        }
        Ok(Self { _private: () })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        restore_terminal();
    }
}

pub struct SuspendedTerminal {
    _private: (),
}

impl SuspendedTerminal {
    pub fn new() -> Self {
        restore_terminal();
        Self { _private: () }
    }
}

impl Default for SuspendedTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SuspendedTerminal {
    fn drop(&mut self) {
        if let Err(e) = acquire() {
            warn!("Failed to reacquire terminal after external program: {e}");
        }
    }
}
