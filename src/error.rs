use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors: anything here stops `ptw` before or outside the watch loop.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read config file {}", path.display())]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}: {message}", path.display())]
    ParseConfig { path: PathBuf, message: String },

    #[error("invalid delay {0}: must be a non-negative number of seconds")]
    InvalidDelay(f64),

    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("cannot watch {}", path.display())]
    WatchPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("file watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),
}

/// Failure to start the runner. Reported by the loop, never fatal.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("runner '{program}' not found")]
    NotFound { program: String },

    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
}
