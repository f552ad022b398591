//! Filesystem event source
//!
//! Each monitored project gets its own recursive watcher. Events are delivered
//! straight into the project's [`WatchSession`] from the watcher's callback
//! thread; watcher errors are forwarded to the supervisor as faults.

use crate::session::WatchSession;
use autocommit_core::{MonitorError, Project, ACTIVITY_TARGET};
use notify::event::{CreateKind, RemoveKind};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// A change notification for one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Failure reported by an event source after registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFault {
    pub project: String,
    pub reason: String,
}

/// Routes events for one project's subtree into its session
#[derive(Clone)]
pub struct ChangeSink {
    session: Arc<WatchSession>,
    faults: mpsc::UnboundedSender<SourceFault>,
}

impl ChangeSink {
    pub fn new(session: Arc<WatchSession>, faults: mpsc::UnboundedSender<SourceFault>) -> Self {
        Self { session, faults }
    }

    pub fn project(&self) -> &Project {
        self.session.project()
    }

    /// Hand an event to the session. Returns true if it was recorded.
    pub fn deliver(&self, event: &ChangeEvent) -> bool {
        let recorded = self.session.record_change(&event.path, event.is_dir);
        if recorded {
            info!(
                target: ACTIVITY_TARGET,
                "Change detected in {}: {}",
                self.session.project().name,
                event.path.display()
            );
        }
        recorded
    }

    /// Report a source failure to the supervisor
    pub fn fault(&self, reason: impl Into<String>) {
        let fault = SourceFault {
            project: self.session.project().name.clone(),
            reason: reason.into(),
        };
        // Receiver gone means the supervisor is already tearing down
        let _ = self.faults.send(fault);
    }
}

/// Subscription point for filesystem change notifications
pub trait ChangeSource: Send {
    /// Start delivering events under the sink's project root
    fn watch(&mut self, sink: ChangeSink) -> Result<(), MonitorError>;

    /// Stop all subscriptions
    fn unwatch_all(&mut self);
}

/// [`ChangeSource`] backed by the platform's native watcher
#[derive(Default)]
pub struct NotifySource {
    watchers: Vec<(PathBuf, RecommendedWatcher)>,
}

impl NotifySource {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn watched_count(&self) -> usize {
        self.watchers.len()
    }
}

impl ChangeSource for NotifySource {
    fn watch(&mut self, sink: ChangeSink) -> Result<(), MonitorError> {
        let root = sink.project().path.clone();
        let watch_error = |e: notify::Error| MonitorError::Watch {
            path: root.clone(),
            reason: e.to_string(),
        };

        let handler = sink.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if !is_change(&event.kind) {
                    return;
                }
                for path in event.paths {
                    let is_dir = is_directory_event(&event.kind, &path);
                    handler.deliver(&ChangeEvent { path, is_dir });
                }
            }
            Err(e) => handler.fault(e.to_string()),
        })
        .map_err(watch_error)?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(watch_error)?;

        debug!(project = %sink.project().name, "watching {}", root.display());
        self.watchers.push((root, watcher));
        Ok(())
    }

    fn unwatch_all(&mut self) {
        for (root, mut watcher) in self.watchers.drain(..) {
            if let Err(e) = watcher.unwatch(&root) {
                debug!("unwatch {} failed: {}", root.display(), e);
            }
        }
    }
}

/// Reads and metadata-free opens are not changes
fn is_change(kind: &EventKind) -> bool {
    !matches!(kind, EventKind::Access(_) | EventKind::Other)
}

/// Whether an event concerns a directory
///
/// The event kind wins when it says; a removed path can no longer be
/// inspected on disk.
fn is_directory_event(kind: &EventKind, path: &Path) -> bool {
    match kind {
        EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => true,
        EventKind::Create(CreateKind::File) | EventKind::Remove(RemoveKind::File) => false,
        _ => path.is_dir(),
    }
}
