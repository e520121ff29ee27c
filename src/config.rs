use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cli::Cli;
use crate::error::{Error, Result};

pub const DEFAULT_DELAY: f64 = 0.2;
pub const DEFAULT_RUNNER: &str = "pytest";
pub const DEFAULT_PATTERNS: &[&str] = &["*.py"];

/// Manifest searched for upwards from the working directory.
pub const MANIFEST_NAME: &str = "pyproject.toml";
/// Table under `[tool]` holding our settings.
pub const SECTION: &str = "pytest_watcher";

/// Resolved runtime settings. Built once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub path: PathBuf,
    pub now: bool,
    pub clear: bool,
    pub delay: Duration,
    pub runner: String,
    pub runner_args: Vec<OsString>,
    pub patterns: Vec<String>,
    pub ignore_patterns: Vec<String>,
}

/// Settings read from `[tool.pytest_watcher]`. Every key is optional.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct FileConfig {
    pub now: Option<bool>,
    pub clear: Option<bool>,
    pub delay: Option<f64>,
    pub runner: Option<String>,
    pub runner_args: Option<Vec<String>>,
    pub patterns: Option<Vec<String>>,
    pub ignore_patterns: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct Manifest {
    tool: Option<Tools>,
}

#[derive(Debug, Default, Deserialize)]
struct Tools {
    #[serde(rename = "pytest_watcher")]
    watcher: Option<FileConfig>,
}

impl Config {
    /// Discover the project config from `start` and merge it under `cli`.
    pub fn load(cli: Cli, start: &Path) -> Result<Self> {
        let file = match find_manifest(start) {
            Some(manifest) => {
                tracing::debug!(path = %manifest.display(), "using project config");
                parse_manifest(&manifest)?
            }
            None => FileConfig::default(),
        };
        Self::resolve(cli, file)
    }

    /// Merge defaults < `file` < `cli`. Unset command-line values are skipped.
    pub fn resolve(cli: Cli, file: FileConfig) -> Result<Self> {
        let delay_secs = cli.delay.or(file.delay).unwrap_or(DEFAULT_DELAY);
        let delay = Duration::try_from_secs_f64(delay_secs)
            .map_err(|_| Error::InvalidDelay(delay_secs))?;

        let runner_args = if cli.runner_args.is_empty() {
            file.runner_args
                .unwrap_or_default()
                .into_iter()
                .map(OsString::from)
                .collect()
        } else {
            cli.runner_args
        };

        let patterns = cli
            .patterns
            .map(|list| list.0)
            .or(file.patterns)
            .filter(|patterns| !patterns.is_empty())
            .unwrap_or_else(|| DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect());

        Ok(Self {
            path: cli.path,
            now: cli.now || file.now.unwrap_or(false),
            clear: cli.clear || file.clear.unwrap_or(false),
            delay,
            runner: cli
                .runner
                .or(file.runner)
                .unwrap_or_else(|| DEFAULT_RUNNER.to_string()),
            runner_args,
            patterns,
            ignore_patterns: cli
                .ignore_patterns
                .map(|list| list.0)
                .or(file.ignore_patterns)
                .unwrap_or_default(),
        })
    }
}

/// Walk up from `start` to the first directory containing a manifest.
pub fn find_manifest(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(MANIFEST_NAME))
        .find(|candidate| candidate.is_file())
}

/// Read our section out of a manifest. A manifest without it yields defaults.
pub fn parse_manifest(path: &Path) -> Result<FileConfig> {
    let (file, unknown) = read_section(path)?;
    for key in &unknown {
        tracing::warn!(path = %path.display(), %key, "ignoring unknown config key");
    }
    Ok(file)
}

/// Our section plus the keys inside it that were not recognised.
fn read_section(path: &Path) -> Result<(FileConfig, Vec<String>)> {
    let content = fs::read_to_string(path).map_err(|source| Error::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;

    let mut ignored: Vec<String> = Vec::new();
    let deserializer = toml::de::Deserializer::new(&content);

    let manifest: Manifest = serde_ignored::deserialize(deserializer, |key| {
        ignored.push(key.to_string());
    })
    .map_err(|e| Error::ParseConfig {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let unknown = ignored.iter().filter_map(|k| section_key(k)).collect();
    let file = manifest
        .tool
        .and_then(|tools| tools.watcher)
        .unwrap_or_default();
    Ok((file, unknown))
}

/// Key relative to `[tool.pytest_watcher]` for an ignored-key path, if it
/// lies inside our section. `?` segments mark optional values.
fn section_key(ignored: &str) -> Option<String> {
    let segments: Vec<&str> = ignored.split('.').filter(|s| *s != "?").collect();
    match segments.as_slice() {
        ["tool", section, rest @ ..] if *section == SECTION && !rest.is_empty() => {
            Some(rest.join("."))
        }
        _ => None,
    }
}
