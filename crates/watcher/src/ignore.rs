//! Ignore pattern matching for a project
//!
//! Patterns come from the project's `.gitignore`, read once when the session is
//! created, plus the built-in `.git` pattern which is always active.
//!
//! Matching is deliberately simple: a path is ignored when its text starts with
//! `<project root>/<pattern>`. There is no glob, negation or anchoring support,
//! so `build/` also ignores `builder.rs`, and `*.log` matches nothing. Editing
//! the ignore file takes effect when the monitor restarts.

use autocommit_core::IGNORE_FILE;
use std::path::{Path, PathBuf};

/// Version control metadata directory, always ignored
const BUILTIN_PATTERN: &str = ".git";

/// Prefix-based ignore rules for one project
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    /// Project root directory
    repo_root: PathBuf,

    /// Ordered patterns, built-in first, separators already stripped
    patterns: Vec<String>,

    /// `<root>/<pattern>` for each pattern, as compared against event paths
    prefixes: Vec<String>,
}

impl IgnoreRules {
    /// Load ignore rules for a project root
    ///
    /// A missing or unreadable ignore file yields the built-in rule only.
    pub fn load(repo_root: &Path) -> Self {
        let ignore_path = repo_root.join(IGNORE_FILE);
        let content = match std::fs::read_to_string(&ignore_path) {
            Ok(content) => content,
            Err(e) => {
                if ignore_path.exists() {
                    tracing::warn!(path = %ignore_path.display(), "cannot read ignore file: {}", e);
                }
                String::new()
            }
        };

        Self::from_patterns(repo_root, content.lines())
    }

    /// Build rules from pattern lines
    ///
    /// Lines are trimmed; blank lines and `#` comments are skipped; leading
    /// and trailing `/` are stripped.
    pub fn from_patterns<'a>(repo_root: &Path, lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut patterns = vec![BUILTIN_PATTERN.to_string()];

        for line in lines {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let pattern = line.trim_matches('/');
            if pattern.is_empty() || patterns.iter().any(|p| p == pattern) {
                continue;
            }
            patterns.push(pattern.to_string());
        }

        let prefixes = patterns
            .iter()
            .map(|p| repo_root.join(p).to_string_lossy().into_owned())
            .collect();

        Self {
            repo_root: repo_root.to_path_buf(),
            patterns,
            prefixes,
        }
    }

    /// Check if an absolute path is excluded
    pub fn is_ignored(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.prefixes.iter().any(|prefix| path_str.starts_with(prefix.as_str()))
    }

    /// Active patterns, built-in first
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Get project root
    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }
}
