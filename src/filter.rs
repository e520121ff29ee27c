use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::error::{Error, Result};

/// Decides which changed paths under the watch root should trigger a run.
///
/// Patterns use gitignore glob rules relative to the root: `*.py` matches
/// at any depth and `templates/*.py` is anchored. Include patterns match
/// the changed path itself; an excluded directory also covers everything
/// below it. Exclusion wins over inclusion.
#[derive(Debug)]
pub struct PathFilter {
    root: PathBuf,
    include: Gitignore,
    exclude: Gitignore,
}

impl PathFilter {
    pub fn new(root: &Path, patterns: &[String], ignore_patterns: &[String]) -> Result<Self> {
        Ok(Self {
            root: root.to_path_buf(),
            include: build_matcher(root, patterns)?,
            exclude: build_matcher(root, ignore_patterns)?,
        })
    }

    /// Whether a change at `path` is relevant.
    pub fn matches(&self, path: &Path) -> bool {
        // Paths outside the root cannot be matched against anchored patterns.
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return false;
        };
        if relative.as_os_str().is_empty() {
            return false;
        }

        if self
            .exclude
            .matched_path_or_any_parents(relative, false)
            .is_ignore()
        {
            return false;
        }

        // Include patterns select files by their own path only.
        self.include.matched(relative, false).is_ignore()
    }
}

fn build_matcher(root: &Path, patterns: &[String]) -> Result<Gitignore> {
    let mut builder = GitignoreBuilder::new(root);
    for pattern in patterns {
        builder
            .add_line(None, pattern)
            .map_err(|e| Error::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
    }
    builder.build().map_err(|e| Error::InvalidPattern {
        pattern: patterns.join(","),
        reason: e.to_string(),
    })
}
