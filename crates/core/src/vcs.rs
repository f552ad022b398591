//! Version control seam
//!
//! The watcher only needs two questions answered by the version control tool:
//! is there anything to commit, and did commit-and-push succeed. The `git`
//! crate provides the subprocess implementation; tests use in-memory fakes.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Failure of an external version control command
#[derive(Debug, Error)]
pub enum VcsError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {}: {stderr}", display_status(.status))]
    CommandFailed {
        command: String,
        status: Option<i32>,
        stderr: String,
    },
}

fn display_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Whether the working tree at `repo` has anything to commit
    async fn has_pending_changes(&self, repo: &Path) -> Result<bool, VcsError>;

    /// Stage everything, commit with `message`, push to the configured branch
    async fn commit_and_push(&self, repo: &Path, message: &str) -> Result<(), VcsError>;
}
