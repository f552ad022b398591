//! Project discovery

use crate::{MonitorError, ProjectFilter, Result};
use std::path::{Path, PathBuf};

/// Name of the per-project ignore file. A project is only monitored, and only
/// ever committed, while this file exists at its root.
pub const IGNORE_FILE: &str = ".gitignore";

/// A monitored directory under the projects root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Directory name, used for display and filtering
    pub name: String,
    /// Absolute path of the project root
    pub path: PathBuf,
}

impl Project {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn ignore_file(&self) -> PathBuf {
        self.path.join(IGNORE_FILE)
    }

    pub fn has_ignore_file(&self) -> bool {
        self.ignore_file().is_file()
    }
}

/// List the immediate subdirectories of `root` that qualify for monitoring
///
/// A subdirectory qualifies when it contains an ignore file and its name passes
/// `filter`. Results are sorted by name.
pub fn discover_projects(root: &Path, filter: &ProjectFilter) -> Result<Vec<Project>> {
    let unreadable = |source| MonitorError::ProjectsRootUnreadable {
        path: root.to_path_buf(),
        source,
    };

    let root = root.canonicalize().map_err(unreadable)?;
    let mut projects = Vec::new();

    for entry in std::fs::read_dir(&root).map_err(unreadable)? {
        let entry = entry.map_err(unreadable)?;
        let path = entry.path();

        if !path.is_dir() {
            continue;
        }

        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => {
                tracing::debug!(path = %path.display(), "skipping non UTF-8 directory name");
                continue;
            }
        };

        if !filter.matches(&name) {
            continue;
        }

        let project = Project::new(name, path);
        if !project.has_ignore_file() {
            tracing::debug!(project = %project.name, "no {} at root, not monitored", IGNORE_FILE);
            continue;
        }

        projects.push(project);
    }

    projects.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(projects)
}
