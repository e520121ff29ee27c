mod cli;
mod config;
mod error;
mod event;
mod filter;
mod keys;
mod logging;
mod runner;
mod scheduler;
mod trigger;
mod watcher;

use std::path::Path;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::Cli;
use crate::config::Config;
use crate::error::Error;
use crate::filter::PathFilter;
use crate::keys::TerminalKeys;
use crate::runner::ProcessRunner;
use crate::scheduler::{Scheduler, Shutdown};
use crate::trigger::Trigger;

/// Conventional exit status after SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    logging::init_tracing();

    match run(cli) {
        Ok(Shutdown::Quit) => ExitCode::SUCCESS,
        Ok(Shutdown::Interrupted) => ExitCode::from(EXIT_INTERRUPTED),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<Shutdown> {
    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    let config = Config::load(cli, &cwd)?;
    tracing::debug!(?config, "configuration resolved");

    let root = canonical_root(&config.path)?;
    let filter = PathFilter::new(&root, &config.patterns, &config.ignore_patterns)?;

    // ── Ctrl-C: only raise a flag, the loop decides when to stop ──
    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
        .context("failed to install Ctrl-C handler")?;

    // ── Filesystem watcher thread ───────────────────────────────
    let trigger = Arc::new(Trigger::new());
    let _watcher = watcher::spawn(&root, filter, Arc::clone(&trigger))?;

    print_banner(&config, &root);

    // ── Main loop ───────────────────────────────────────────────
    let keys = TerminalKeys::new().map_err(Error::from)?;
    let mut scheduler = Scheduler::new(&config, trigger, interrupted, keys, ProcessRunner);

    Ok(scheduler.start()?)
}

fn canonical_root(path: &Path) -> Result<std::path::PathBuf> {
    let root = path.canonicalize().map_err(|source| Error::WatchPath {
        path: path.to_path_buf(),
        source,
    })?;
    if !root.is_dir() {
        anyhow::bail!("{} is not a directory", root.display());
    }
    Ok(root)
}

fn print_banner(config: &Config, root: &Path) {
    println!("[ptw] Watching {}", root.display());
    println!("[ptw] Runner: {}", runner::Invocation::compose(&config.runner, &config.runner_args, &[]));
    println!(
        "[ptw] Patterns: {}  Ignored: {}",
        config.patterns.join(", "),
        if config.ignore_patterns.is_empty() {
            "-".to_string()
        } else {
            config.ignore_patterns.join(", ")
        }
    );
    println!("[ptw] Delay: {:.1}s  (press w to show the menu)", config.delay.as_secs_f64());
}
