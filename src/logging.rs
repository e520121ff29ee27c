use std::io::{self, Write};

use crossterm::terminal;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `PTW_LOG=debug`.
pub const LOG_ENV: &str = "PTW_LOG";

/// Install the global subscriber. Records go to stderr.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(TerminalStderr::default)
        .init();
}

/// Stderr writer that stays readable while the keyboard holds raw mode.
///
/// Raw mode disables output post-processing, so a bare `\n` moves down
/// without returning to column 0. Log records written from the watcher
/// thread at that time get their line endings expanded to `\r\n`.
#[derive(Debug, Default)]
pub struct TerminalStderr;

impl Write for TerminalStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let raw = terminal::is_raw_mode_enabled().unwrap_or(false);
        write_lines(&mut io::stderr().lock(), buf, raw)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

/// Copy `buf` to `out`, ending every line with `\r\n` when `raw` is set.
fn write_lines<W: Write>(out: &mut W, buf: &[u8], raw: bool) -> io::Result<()> {
    if !raw {
        return out.write_all(buf);
    }
    for chunk in buf.split_inclusive(|b| *b == b'\n') {
        match chunk.strip_suffix(b"\n") {
            Some(line) => {
                out.write_all(line.strip_suffix(b"\r").unwrap_or(line))?;
                out.write_all(b"\r\n")?;
            }
            None => out.write_all(chunk)?,
        }
    }
    Ok(())
}
