//! Git command integration
//!
//! Commits and pushes a project by shelling out to `git`:
//! - `git status --porcelain` to detect pending changes
//! - `git add .`, `git commit -m <message>`, `git push <remote> <branch>`
//!
//! Output is not interpreted beyond exit status and the porcelain listing.

use async_trait::async_trait;
use autocommit_core::{VcsError, VersionControl};
use std::ffi::OsString;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

/// [`VersionControl`] implementation driving the `git` executable
#[derive(Debug, Clone)]
pub struct GitCli {
    program: OsString,
    remote: String,
    branch: String,
}

impl GitCli {
    pub fn new(remote: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            program: OsString::from("git"),
            remote: remote.into(),
            branch: branch.into(),
        }
    }

    /// Use a different executable instead of `git` from `PATH`
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Run `git <args>` in `repo`, returning stdout on success
    async fn run(&self, repo: &Path, args: &[&str]) -> Result<String, VcsError> {
        let command = format!("git {}", args.join(" "));
        debug!(repo = %repo.display(), "{}", command);

        let output = Command::new(&self.program)
            .current_dir(repo)
            .args(args)
            // Never block a background agent on a credential prompt
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| VcsError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(VcsError::CommandFailed {
                command,
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("origin", "main")
    }
}

#[async_trait]
impl VersionControl for GitCli {
    async fn has_pending_changes(&self, repo: &Path) -> Result<bool, VcsError> {
        let status = self.run(repo, &["status", "--porcelain"]).await?;
        Ok(!status.trim().is_empty())
    }

    async fn commit_and_push(&self, repo: &Path, message: &str) -> Result<(), VcsError> {
        self.run(repo, &["add", "."]).await?;
        self.run(repo, &["commit", "-m", message]).await?;
        self.run(repo, &["push", &self.remote, &self.branch]).await?;
        Ok(())
    }
}
