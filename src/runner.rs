use std::borrow::Cow;
use std::ffi::OsString;
use std::fmt;
use std::io::{self, Write};
use std::process::{Command, ExitStatus};

use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{Clear, ClearType},
};

use crate::error::RunnerError;

/// A fully composed runner command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<OsString>,
}

impl Invocation {
    /// `[runner] + base_args + extra_args`.
    ///
    /// `runner` is always a single program token, even when it contains
    /// spaces; multi-word commands arrive split across `base_args`.
    pub fn compose(runner: &str, base_args: &[OsString], extra_args: &[String]) -> Self {
        Self {
            program: runner.to_string(),
            args: base_args
                .iter()
                .cloned()
                .chain(extra_args.iter().map(OsString::from))
                .collect(),
        }
    }

    /// Program followed by its arguments, lossily decoded for display.
    pub fn argv(&self) -> Vec<Cow<'_, str>> {
        std::iter::once(Cow::Borrowed(self.program.as_str()))
            .chain(self.args.iter().map(|arg| arg.to_string_lossy()))
            .collect()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.argv().join(" "))
    }
}

/// Executes the test command on behalf of the main loop.
pub trait Runner {
    /// Run to completion. Blocks the caller for the whole run.
    fn invoke(&mut self, invocation: &Invocation) -> Result<ExitStatus, RunnerError>;

    fn clear_screen(&mut self) -> io::Result<()>;
}

/// Spawns the runner as a child process sharing our terminal.
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl Runner for ProcessRunner {
    fn invoke(&mut self, invocation: &Invocation) -> Result<ExitStatus, RunnerError> {
        // `status()` inherits stdin/stdout/stderr.
        Command::new(&invocation.program)
            .args(&invocation.args)
            .status()
            .map_err(|source| match source.kind() {
                io::ErrorKind::NotFound => RunnerError::NotFound {
                    program: invocation.program.clone(),
                },
                _ => RunnerError::Launch {
                    program: invocation.program.clone(),
                    source,
                },
            })
    }

    fn clear_screen(&mut self) -> io::Result<()> {
        let mut stdout = io::stdout();
        execute!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;
        stdout.flush()
    }
}
