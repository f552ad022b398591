//! Per-project watch session
//!
//! A session is written from two sides. The filesystem listener calls
//! [`WatchSession::record_change`], which only ever moves the last-change
//! timestamp forward. The supervisor's periodic tick calls
//! [`WatchSession::try_begin_commit`] and, when the project has been quiet for
//! `commit_delay`, spawns [`WatchSession::run_commit_cycle`] as the project's
//! own task. Retries after a failed commit happen inside that task, so a slow
//! or failing project never holds up the debounce checks of the others.
//!
//! ```text
//!            change event              tick, quiet >= commit_delay
//!   Idle ----------------> PendingCommit --------------------------> Committing
//!    ^                                                                 |   ^
//!    |  success / nothing to commit / no ignore file / too large       |   | retry_delay
//!    +-----------------------------------------------------------------+   |
//!                                        git failure --> RetryBackoff -----+
//! ```

use crate::ignore::IgnoreRules;
use autocommit_core::{Project, Reporter, SessionSettings, VersionControl};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing newer than the last successful commit
    Idle,
    /// A change was observed; waiting for the project to go quiet
    PendingCommit,
    /// A commit cycle is running in the project's task
    Committing,
    /// The last commit failed; a single retry is scheduled
    RetryBackoff,
}

/// Result of one commit attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Changes were committed and pushed
    Committed { message: String },
    /// Working tree had no changes; nothing was committed or pushed
    NothingToCommit,
    /// Project root has no ignore file; skipped silently
    IgnoreFileAbsent,
    /// Tracked files exceed the size limit; skipped without retry
    SizeLimitExceeded { size: u64, limit: u64 },
    /// Status, add, commit or push failed; a retry is scheduled
    VersionControlFailure { detail: String },
    /// The size scan was cancelled by runtime shutdown
    Interrupted,
}

impl CycleOutcome {
    /// Log and notify the outcome on behalf of `project`
    pub fn report(&self, project: &str, retry_delay: Duration, reporter: &dyn Reporter) {
        match self {
            CycleOutcome::Committed { message } => {
                let text = format!(
                    "Successfully committed and pushed {} with message: \"{}\"",
                    project, message
                );
                reporter.log(&text);
                reporter.notify(&text);
            }
            CycleOutcome::NothingToCommit => {
                reporter.log(&format!("No changes to commit for {}. Skipping.", project));
            }
            CycleOutcome::IgnoreFileAbsent => {
                debug!(project, "ignore file missing, commit skipped");
            }
            CycleOutcome::SizeLimitExceeded { size, limit } => {
                let text = format!(
                    "{} exceeds size limit of {} MB ({} MB tracked). Skipping.",
                    project,
                    limit / (1024 * 1024),
                    size / (1024 * 1024)
                );
                reporter.log(&text);
                reporter.notify(&text);
            }
            CycleOutcome::VersionControlFailure { detail } => {
                let text = format!(
                    "Error in {}: {}. Retrying in {}.",
                    project,
                    detail,
                    format_delay(retry_delay)
                );
                reporter.log(&text);
                reporter.notify(&text);
            }
            CycleOutcome::Interrupted => {
                debug!(project, "commit cycle interrupted");
            }
        }
    }
}

fn format_delay(delay: Duration) -> String {
    let secs = delay.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        let minutes = secs / 60;
        format!("{} minute{}", minutes, if minutes == 1 { "" } else { "s" })
    } else {
        format!("{} second{}", secs, if secs == 1 { "" } else { "s" })
    }
}

struct Inner {
    state: SessionState,
    /// `None` means no pending change
    last_change: Option<Instant>,
}

/// Watch state for one project
pub struct WatchSession {
    project: Project,
    ignore: IgnoreRules,
    settings: SessionSettings,
    inner: Mutex<Inner>,
}

impl WatchSession {
    /// Create a session, loading the project's ignore rules once
    pub fn new(project: Project, settings: SessionSettings) -> Self {
        let ignore = IgnoreRules::load(&project.path);
        Self::with_rules(project, ignore, settings)
    }

    fn with_rules(project: Project, ignore: IgnoreRules, settings: SessionSettings) -> Self {
        Self {
            project,
            ignore,
            settings,
            inner: Mutex::new(Inner {
                state: SessionState::Idle,
                last_change: None,
            }),
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn ignore_rules(&self) -> &IgnoreRules {
        &self.ignore
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    pub fn last_change(&self) -> Option<Instant> {
        self.inner.lock().last_change
    }

    /// Record a filesystem change observed now
    pub fn record_change(&self, path: &Path, is_dir: bool) -> bool {
        self.record_change_at(path, is_dir, Instant::now())
    }

    /// Record a filesystem change observed at `at`
    ///
    /// Directory events and ignored paths are dropped. Returns true if the
    /// change was recorded. The timestamp never moves backwards.
    pub fn record_change_at(&self, path: &Path, is_dir: bool, at: Instant) -> bool {
        if is_dir || self.ignore.is_ignored(path) {
            return false;
        }

        let mut inner = self.inner.lock();
        inner.last_change = Some(match inner.last_change {
            Some(prev) if prev > at => prev,
            _ => at,
        });
        if inner.state == SessionState::Idle {
            inner.state = SessionState::PendingCommit;
        }
        true
    }

    /// Whether a commit should start at `now`
    pub fn is_due(&self, now: Instant) -> bool {
        let inner = self.inner.lock();
        Self::due(&inner, now, self.settings.commit_delay)
    }

    fn due(inner: &Inner, now: Instant, commit_delay: Duration) -> bool {
        matches!(inner.state, SessionState::Idle | SessionState::PendingCommit)
            && inner
                .last_change
                .map_or(false, |at| now.saturating_duration_since(at) >= commit_delay)
    }

    /// Move to `Committing` if the session is due at `now`
    ///
    /// The caller that gets `true` owns the commit cycle and must run
    /// [`run_commit_cycle`](Self::run_commit_cycle).
    pub fn try_begin_commit(&self, now: Instant) -> bool {
        let mut inner = self.inner.lock();
        if !Self::due(&inner, now, self.settings.commit_delay) {
            return false;
        }
        inner.state = SessionState::Committing;
        true
    }

    /// Drive a commit cycle to completion, retrying after failures
    ///
    /// Each failure moves the session to `RetryBackoff` and sleeps for
    /// `retry_delay` before the next attempt; there is no retry cap. The
    /// backoff sleep ends early when `shutdown` changes.
    pub async fn run_commit_cycle(
        self: Arc<Self>,
        vcs: Arc<dyn VersionControl>,
        reporter: Arc<dyn Reporter>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            let snapshot = self.last_change();
            let outcome = self.attempt_commit(vcs.as_ref()).await;
            outcome.report(&self.project.name, self.settings.retry_delay, reporter.as_ref());

            if self.settle(&outcome, snapshot) != SessionState::RetryBackoff {
                return;
            }

            if *shutdown.borrow() {
                return;
            }
            tokio::select! {
                _ = tokio::time::sleep(self.settings.retry_delay) => {}
                _ = shutdown.changed() => {
                    debug!(project = %self.project.name, "retry cancelled by shutdown");
                    return;
                }
            }

            self.inner.lock().state = SessionState::Committing;
            info!(project = %self.project.name, "retrying commit");
        }
    }

    /// One pass of the commit pipeline: gate, size check, status, commit+push
    pub async fn attempt_commit(&self, vcs: &dyn VersionControl) -> CycleOutcome {
        if !self.project.has_ignore_file() {
            return CycleOutcome::IgnoreFileAbsent;
        }

        let rules = self.ignore.clone();
        let size = match tokio::task::spawn_blocking(move || tracked_size(&rules)).await {
            Ok(size) => size,
            Err(e) => match e.try_into_panic() {
                Ok(panic) => std::panic::resume_unwind(panic),
                Err(_) => return CycleOutcome::Interrupted,
            },
        };

        let limit = self.settings.size_limit_bytes;
        if size > limit {
            warn!(project = %self.project.name, size, limit, "size limit exceeded");
            return CycleOutcome::SizeLimitExceeded { size, limit };
        }

        match vcs.has_pending_changes(&self.project.path).await {
            Ok(false) => return CycleOutcome::NothingToCommit,
            Ok(true) => {}
            Err(e) => {
                return CycleOutcome::VersionControlFailure {
                    detail: e.to_string(),
                }
            }
        }

        info!(project = %self.project.name, "starting commit and push");
        let message = commit_message();
        match vcs.commit_and_push(&self.project.path, &message).await {
            Ok(()) => CycleOutcome::Committed { message },
            Err(e) => CycleOutcome::VersionControlFailure {
                detail: e.to_string(),
            },
        }
    }

    /// Apply an outcome to the state machine
    ///
    /// `snapshot` is the last-change timestamp seen when the attempt started.
    /// The pending change is only cleared if no newer event arrived meanwhile.
    fn settle(&self, outcome: &CycleOutcome, snapshot: Option<Instant>) -> SessionState {
        let mut inner = self.inner.lock();
        let next = match outcome {
            CycleOutcome::Committed { .. } | CycleOutcome::NothingToCommit => {
                if inner.last_change == snapshot {
                    inner.last_change = None;
                }
                if inner.last_change.is_some() {
                    SessionState::PendingCommit
                } else {
                    SessionState::Idle
                }
            }
            // Change stays pending and is re-checked at the next quiet tick
            CycleOutcome::IgnoreFileAbsent
            | CycleOutcome::SizeLimitExceeded { .. }
            | CycleOutcome::Interrupted => SessionState::Idle,
            CycleOutcome::VersionControlFailure { .. } => SessionState::RetryBackoff,
        };
        inner.state = next;
        next
    }
}

/// Total size in bytes of the non-ignored files under the rules' root
///
/// Ignored directories are pruned without descending. Entries that vanish or
/// cannot be read during the walk are skipped.
pub fn tracked_size(rules: &IgnoreRules) -> u64 {
    let mut total = 0u64;

    for entry in WalkDir::new(rules.repo_root())
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !rules.is_ignored(e.path()))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        match entry.metadata() {
            Ok(metadata) => total += metadata.len(),
            Err(e) => debug!(path = %entry.path().display(), "skipping file: {}", e),
        }
    }

    total
}

/// Commit message with the local time in `ctime` layout
pub fn commit_message() -> String {
    format!(
        "Automated commit: {}",
        chrono::Local::now().format("%a %b %e %H:%M:%S %Y")
    )
}
