use std::ffi::OsString;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::error::Result;
use crate::event::{self, Action};
use crate::keys::KeySource;
use crate::runner::{Invocation, Runner};
use crate::trigger::Trigger;

/// Sleep between polls. Independent of the debounce delay.
pub const LOOP_DELAY: Duration = Duration::from_millis(100);

/// Why the main loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    /// The quit key was pressed.
    Quit,
    /// Ctrl-C, either as a signal or as a raw-mode keystroke.
    Interrupted,
}

/// Outcome of a single loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Nothing pending.
    Idle,
    /// A change is pending but the debounce window is still open.
    Waiting,
    /// The runner was invoked.
    Ran,
    /// A keystroke was consumed without running anything.
    Key,
    Stop(Shutdown),
}

/// The scheduler: the only place that reads and clears the trigger, reads
/// keystrokes and launches the runner.
pub struct Scheduler<K, R> {
    runner_name: String,
    runner_args: Vec<OsString>,
    delay: Duration,
    clear: bool,
    now: bool,
    trigger: Arc<Trigger>,
    interrupted: Arc<AtomicBool>,
    keys: K,
    runner: R,
}

impl<K: KeySource, R: Runner> Scheduler<K, R> {
    pub fn new(
        config: &Config,
        trigger: Arc<Trigger>,
        interrupted: Arc<AtomicBool>,
        keys: K,
        runner: R,
    ) -> Self {
        Self {
            runner_name: config.runner.clone(),
            runner_args: config.runner_args.clone(),
            delay: config.delay,
            clear: config.clear,
            now: config.now,
            trigger,
            interrupted,
            keys,
            runner,
        }
    }

    /// Arm the first run if requested, then enter the loop.
    pub fn start(&mut self) -> Result<Shutdown> {
        self.arm_initial_run();
        self.run()
    }

    /// With `now` set, emit into the trigger so the first run takes the
    /// ordinary debounced path.
    fn arm_initial_run(&self) {
        if self.now {
            tracing::debug!("initial run requested");
            self.trigger.emit();
        }
    }

    /// Poll until the user quits or the process is interrupted.
    pub fn run(&mut self) -> Result<Shutdown> {
        loop {
            if let Tick::Stop(shutdown) = self.step(Instant::now())? {
                return Ok(shutdown);
            }
            thread::sleep(LOOP_DELAY);
        }
    }

    /// One scheduling decision at time `now`.
    ///
    /// Keystrokes take priority over the trigger; a pending change only
    /// fires once `delay` has elapsed since the *first* change.
    pub fn step(&mut self, now: Instant) -> Result<Tick> {
        if self.interrupted.load(Ordering::SeqCst) {
            return Ok(Tick::Stop(Shutdown::Interrupted));
        }

        if let Some(key) = self.keys.poll_key()? {
            return match event::decode(key) {
                Action::Quit => Ok(Tick::Stop(Shutdown::Quit)),
                Action::Interrupt => Ok(Tick::Stop(Shutdown::Interrupted)),
                Action::Run(extra) => {
                    self.run_tests(&extra)?;
                    Ok(Tick::Ran)
                }
                Action::ShowMenu => {
                    self.show_menu()?;
                    Ok(Tick::Key)
                }
                Action::Ignore => {
                    tracing::debug!(?key, "unbound key");
                    Ok(Tick::Key)
                }
            };
        }

        let Some(first_change) = self.trigger.pending() else {
            return Ok(Tick::Idle);
        };

        if now.saturating_duration_since(first_change) < self.delay {
            return Ok(Tick::Waiting);
        }

        self.run_tests(&[])?;
        Ok(Tick::Ran)
    }

    /// Invoke the runner immediately, then release the trigger.
    fn run_tests(&mut self, extra_args: &[String]) -> Result<()> {
        let invocation = Invocation::compose(&self.runner_name, &self.runner_args, extra_args);

        self.keys.suspend()?;

        if self.clear {
            if let Err(err) = self.runner.clear_screen() {
                tracing::warn!(error = %err, "failed to clear screen");
            }
        }

        println!("[ptw] Running: {invocation}");
        match self.runner.invoke(&invocation) {
            Ok(status) => match status.code() {
                Some(code) => println!("[ptw] {} exited with code {code}", invocation.program),
                None => println!("[ptw] {} was terminated by a signal", invocation.program),
            },
            Err(err) => {
                tracing::error!(error = %err, "runner did not start");
                eprintln!("[ptw] {err}");
            }
        }
        println!("[ptw] Watching for changes... press w to show the menu");

        self.trigger.release();
        self.keys.resume()?;
        Ok(())
    }

    fn show_menu(&mut self) -> Result<()> {
        self.keys.suspend()?;
        print!("{}", event::menu());
        self.keys.resume()?;
        Ok(())
    }
}
