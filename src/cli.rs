use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use clap::{Command, CommandFactory, Parser};

/// Comma-separated glob list as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternList(pub Vec<String>);

fn parse_pattern_list(raw: &str) -> Result<PatternList, String> {
    let patterns: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect();
    if patterns.is_empty() {
        return Err("expected at least one pattern".into());
    }
    Ok(PatternList(patterns))
}

#[derive(Parser, Debug, Default)]
#[command(
    name = "ptw",
    version,
    about = "Re-run your test command whenever watched files change",
    after_help = "Unrecognised arguments are passed to the runner as-is."
)]
pub struct Cli {
    /// Directory to watch (defaults to cwd)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Run the tests once right after startup
    #[arg(long)]
    pub now: bool,

    /// Quiet period in seconds between the first change and the run
    #[arg(long, value_name = "SECONDS", allow_negative_numbers = true)]
    pub delay: Option<f64>,

    /// Clear the screen before each run
    #[arg(long)]
    pub clear: bool,

    /// Executable to run instead of pytest
    #[arg(long, value_name = "COMMAND")]
    pub runner: Option<String>,

    /// Comma-separated globs of files that trigger a run
    #[arg(long, value_name = "GLOBS", value_parser = parse_pattern_list)]
    pub patterns: Option<PatternList>,

    /// Comma-separated globs of files that never trigger a run
    #[arg(long, value_name = "GLOBS", value_parser = parse_pattern_list)]
    pub ignore_patterns: Option<PatternList>,

    /// Arguments passed through to the runner. Kept as raw OS strings.
    #[arg(skip)]
    pub runner_args: Vec<OsString>,
}

impl Cli {
    /// Parse the process arguments, exiting with clap's usage message on error.
    pub fn parse_args() -> Self {
        Self::try_parse_args(std::env::args_os()).unwrap_or_else(|err| err.exit())
    }

    /// Parse `args` (including the binary name).
    ///
    /// Flags `ptw` knows may appear anywhere; everything else is collected
    /// in order into [`Cli::runner_args`].
    pub fn try_parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let mut args = args.into_iter().map(Into::into);
        let bin = args.next().unwrap_or_else(|| OsString::from("ptw"));

        let (known, passthrough) = split_args(args);

        let mut cli = Self::try_parse_from(std::iter::once(bin).chain(known))?;
        cli.runner_args = passthrough;
        Ok(cli)
    }
}

/// How a single command-line token is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArgKind {
    /// `--`: everything after it belongs to the runner.
    Separator,
    /// One of our flags, possibly followed by a separate value token.
    Flag { takes_value: bool },
    /// The watch path.
    Path,
    Runner,
}

/// Route `arg` using the flag table of `command`.
///
/// Tokens that are not valid UTF-8 can never name one of our flags, but
/// their lossy form still tells a flag-looking token from a bare one.
fn classify(command: &Command, arg: &OsStr, seen_path: bool) -> ArgKind {
    let text = arg.to_string_lossy();
    if text == "--" {
        return ArgKind::Separator;
    }

    let known = if let Some(long) = text.strip_prefix("--") {
        let (name, inline) = match long.split_once('=') {
            Some((name, _)) => (name, true),
            None => (long, false),
        };
        command
            .get_arguments()
            .find(|a| a.get_long() == Some(name))
            .map(|a| a.get_action().takes_values() && !inline)
    } else if let Some(short) = text.strip_prefix('-').filter(|s| s.chars().count() == 1) {
        command
            .get_arguments()
            .find(|a| a.get_short().is_some_and(|c| short.starts_with(c)))
            .map(|a| a.get_action().takes_values())
    } else if text.starts_with('-') && text.len() > 1 {
        None
    } else if seen_path {
        return ArgKind::Runner;
    } else {
        return ArgKind::Path;
    };

    match known {
        Some(takes_value) => ArgKind::Flag { takes_value },
        None => ArgKind::Runner,
    }
}

/// Separate our own flags (and the first positional) from runner arguments.
fn split_args(mut args: impl Iterator<Item = OsString>) -> (Vec<OsString>, Vec<OsString>) {
    let mut command = Cli::command();
    command.build();

    let mut known = Vec::new();
    let mut passthrough = Vec::new();
    let mut seen_path = false;

    while let Some(arg) = args.next() {
        match classify(&command, &arg, seen_path) {
            ArgKind::Separator => {
                passthrough.extend(args.by_ref());
                break;
            }
            ArgKind::Flag { takes_value } => {
                known.push(arg);
                if takes_value {
                    if let Some(value) = args.next() {
                        known.push(value);
                    }
                }
            }
            ArgKind::Path => {
                seen_path = true;
                known.push(arg);
            }
            ArgKind::Runner => passthrough.push(arg),
        }
    }

    (known, passthrough)
}
