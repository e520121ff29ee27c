use std::io;
use std::time::Duration;

use crossterm::event::{self as ct_event, Event, KeyEvent, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::tty::IsTty;

/// Non-blocking source of single keystrokes.
pub trait KeySource {
    /// Return a buffered keystroke if there is one. Never blocks.
    fn poll_key(&mut self) -> io::Result<Option<KeyEvent>>;

    /// Give the terminal back to a child process.
    fn suspend(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Take the terminal again after [`KeySource::suspend`].
    fn resume(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Reads keys from the controlling terminal in raw mode.
///
/// Raw mode delivers keys without waiting for a newline. When stdin is not
/// a terminal (CI, pipes) the reader stays inert and never reports a key.
pub struct TerminalKeys {
    interactive: bool,
    raw: bool,
}

impl TerminalKeys {
    pub fn new() -> io::Result<Self> {
        let mut keys = Self {
            interactive: io::stdin().is_tty(),
            raw: false,
        };
        keys.resume()?;
        Ok(keys)
    }
}

impl KeySource for TerminalKeys {
    fn poll_key(&mut self) -> io::Result<Option<KeyEvent>> {
        if !self.raw {
            return Ok(None);
        }
        // Drain non-key events (resize, focus) so they don't pile up.
        while ct_event::poll(Duration::ZERO)? {
            if let Event::Key(key) = ct_event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(Some(key));
                }
            }
        }
        Ok(None)
    }

    fn suspend(&mut self) -> io::Result<()> {
        if self.raw {
            disable_raw_mode()?;
            self.raw = false;
        }
        Ok(())
    }

    fn resume(&mut self) -> io::Result<()> {
        if self.interactive && !self.raw {
            enable_raw_mode()?;
            self.raw = true;
        }
        Ok(())
    }
}

impl Drop for TerminalKeys {
    fn drop(&mut self) {
        let _ = self.suspend();
    }
}
