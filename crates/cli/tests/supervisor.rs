//! Supervisor scenarios against an in-memory change source and git
//!
//! Time is paused, so debounce delays, retry backoff and restart pauses
//! elapse instantly while keeping their relative order.

use async_trait::async_trait;
use autocommit_cli::Supervisor;
use autocommit_core::{
    MonitorConfig, MonitorError, ProjectFilter, Reporter, SessionSettings, VcsError,
    VersionControl,
};
use autocommit_watcher::{ChangeEvent, ChangeSink, ChangeSource};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Default)]
struct SourceState {
    sinks: Vec<ChangeSink>,
    watch_calls: usize,
    unwatch_calls: usize,
}

/// Change source that records registrations and lets tests inject events
#[derive(Clone, Default)]
struct FakeSource {
    state: Arc<Mutex<SourceState>>,
}

impl FakeSource {
    fn watched(&self) -> Vec<String> {
        self.state
            .lock()
            .sinks
            .iter()
            .map(|sink| sink.project().name.clone())
            .collect()
    }

    fn watch_calls(&self) -> usize {
        self.state.lock().watch_calls
    }

    fn unwatch_calls(&self) -> usize {
        self.state.lock().unwatch_calls
    }

    fn sink(&self, project: &str) -> ChangeSink {
        self.state
            .lock()
            .sinks
            .iter()
            .find(|sink| sink.project().name == project)
            .cloned()
            .unwrap_or_else(|| panic!("{} is not watched", project))
    }

    fn touch(&self, project: &str, relative: &str) {
        let sink = self.sink(project);
        let path = sink.project().path.join(relative);
        assert!(sink.deliver(&ChangeEvent { path, is_dir: false }));
    }
}

impl ChangeSource for FakeSource {
    fn watch(&mut self, sink: ChangeSink) -> Result<(), MonitorError> {
        let mut state = self.state.lock();
        state.watch_calls += 1;
        state.sinks.push(sink);
        Ok(())
    }

    fn unwatch_all(&mut self) {
        let mut state = self.state.lock();
        state.unwatch_calls += 1;
        state.sinks.clear();
    }
}

/// Git stand-in keyed by project directory name
#[derive(Default)]
struct FakeVcs {
    failing: Vec<String>,
    panicking: Vec<String>,
    attempts: Mutex<Vec<String>>,
    commits: Mutex<Vec<String>>,
}

impl FakeVcs {
    fn failing(names: &[&str]) -> Self {
        Self {
            failing: names.iter().map(|n| n.to_string()).collect(),
            ..Self::default()
        }
    }

    fn panicking(names: &[&str]) -> Self {
        Self {
            panicking: names.iter().map(|n| n.to_string()).collect(),
            ..Self::default()
        }
    }

    fn attempts_for(&self, name: &str) -> usize {
        self.attempts.lock().iter().filter(|n| *n == name).count()
    }

    fn commits(&self) -> Vec<String> {
        self.commits.lock().clone()
    }
}

fn repo_name(repo: &Path) -> String {
    repo.file_name().unwrap().to_string_lossy().into_owned()
}

#[async_trait]
impl VersionControl for FakeVcs {
    async fn has_pending_changes(&self, _repo: &Path) -> Result<bool, VcsError> {
        Ok(true)
    }

    async fn commit_and_push(&self, repo: &Path, _message: &str) -> Result<(), VcsError> {
        let name = repo_name(repo);
        self.attempts.lock().push(name.clone());
        if self.panicking.contains(&name) {
            panic!("git exploded in {}", name);
        }
        if self.failing.contains(&name) {
            return Err(VcsError::CommandFailed {
                command: "git push origin main".into(),
                status: Some(128),
                stderr: "Could not resolve host".into(),
            });
        }
        self.commits.lock().push(name);
        Ok(())
    }
}

#[derive(Default)]
struct RecordingReporter {
    logs: Mutex<Vec<String>>,
    notifications: Mutex<Vec<String>>,
}

impl RecordingReporter {
    fn logged(&self, text: &str) -> bool {
        self.logs.lock().iter().any(|line| line.contains(text))
    }

    fn notified(&self, text: &str) -> bool {
        self.notifications.lock().iter().any(|line| line.contains(text))
    }
}

impl Reporter for RecordingReporter {
    fn log(&self, message: &str) {
        self.logs.lock().push(message.to_string());
    }

    fn notify(&self, message: &str) {
        self.notifications.lock().push(message.to_string());
    }
}

struct Harness {
    _temp_dir: TempDir,
    root: PathBuf,
    source: FakeSource,
    vcs: Arc<FakeVcs>,
    reporter: Arc<RecordingReporter>,
    shutdown: watch::Sender<bool>,
    handle: Option<JoinHandle<Result<(), MonitorError>>>,
}

impl Harness {
    fn new(vcs: FakeVcs) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap().join("projects");
        fs::create_dir_all(&root).unwrap();
        let (shutdown, _) = watch::channel(false);

        Self {
            _temp_dir: temp_dir,
            root,
            source: FakeSource::default(),
            vcs: Arc::new(vcs),
            reporter: Arc::new(RecordingReporter::default()),
            shutdown,
            handle: None,
        }
    }

    fn add_project(&self, name: &str, with_ignore: bool) {
        let dir = self.root.join(name);
        fs::create_dir_all(dir.join("src")).unwrap();
        fs::write(dir.join("src/main.rs"), "fn main() {}\n").unwrap();
        if with_ignore {
            fs::write(dir.join(".gitignore"), "target/\n").unwrap();
        }
    }

    fn config(&self, filter: ProjectFilter) -> MonitorConfig {
        MonitorConfig {
            projects_root: self.root.clone(),
            filter,
            session: SessionSettings {
                commit_delay: Duration::from_secs(60),
                retry_delay: Duration::from_secs(600),
                size_limit_bytes: 150 * 1024 * 1024,
            },
            check_interval: Duration::from_secs(60),
            restart_pause: Duration::from_secs(10),
        }
    }

    fn start(&mut self, config: MonitorConfig) {
        let supervisor = Supervisor::new(
            config,
            self.vcs.clone(),
            self.reporter.clone(),
            Box::new(self.source.clone()),
        );
        self.handle = Some(tokio::spawn(supervisor.run(self.shutdown.subscribe())));
    }

    async fn stop(&mut self) -> Result<(), MonitorError> {
        self.shutdown.send(true).unwrap();
        self.handle.take().unwrap().await.unwrap()
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..2400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    panic!("condition not reached");
}

#[tokio::test(start_paused = true)]
async fn test_quiet_project_committed_once() {
    let mut h = Harness::new(FakeVcs::default());
    h.add_project("alpha", true);
    h.start(h.config(ProjectFilter::All));

    let source = h.source.clone();
    wait_until(|| source.watched() == vec!["alpha"]).await;
    h.source.touch("alpha", "src/main.rs");
    h.source.touch("alpha", "src/lib.rs");

    // Not yet quiet for a full minute at the first tick
    tokio::time::sleep(Duration::from_secs(61)).await;
    assert!(h.vcs.commits().is_empty());

    tokio::time::sleep(Duration::from_secs(70)).await;
    assert_eq!(h.vcs.commits(), vec!["alpha"]);

    // Nothing new: no further commits
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(h.vcs.commits().len(), 1);

    h.stop().await.unwrap();
    assert!(h.reporter.logged("Monitoring project: alpha"));
    assert!(h.reporter.logged("Successfully committed and pushed alpha"));
    assert!(h.reporter.notified("Successfully committed and pushed alpha"));
    assert!(h.source.unwatch_calls() >= 1);
}

#[tokio::test(start_paused = true)]
async fn test_filter_and_ignore_file_select_projects() {
    let mut h = Harness::new(FakeVcs::default());
    h.add_project("alpha", true);
    h.add_project("beta", true);
    h.add_project("gamma", false);
    h.start(h.config(ProjectFilter::Only(vec!["alpha".into(), "gamma".into()])));

    let source = h.source.clone();
    wait_until(|| source.watch_calls() > 0).await;
    assert_eq!(h.source.watched(), vec!["alpha"]);

    h.stop().await.unwrap();
    assert!(!h.reporter.logged("Monitoring project: beta"));
    assert!(!h.reporter.logged("Monitoring project: gamma"));
}

#[tokio::test(start_paused = true)]
async fn test_source_fault_rebuilds_monitor() {
    let mut h = Harness::new(FakeVcs::default());
    h.add_project("alpha", true);
    h.start(h.config(ProjectFilter::All));

    let source = h.source.clone();
    wait_until(|| source.watch_calls() == 1).await;
    h.source.sink("alpha").fault("event queue overflow");

    wait_until(|| source.watch_calls() == 2).await;
    assert_eq!(h.source.watched(), vec!["alpha"]);
    assert_eq!(h.source.unwatch_calls(), 1);
    assert!(h.reporter.logged(
        "Unexpected error: supervisor fault: change source for alpha failed: event queue overflow. Restarting monitor."
    ));
    assert!(h.reporter.notified("Restarting monitor"));

    // The rebuilt generation still commits
    h.source.touch("alpha", "src/main.rs");
    tokio::time::sleep(Duration::from_secs(130)).await;
    assert_eq!(h.vcs.commits(), vec!["alpha"]);

    h.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_panicked_commit_task_rebuilds_monitor() {
    let mut h = Harness::new(FakeVcs::panicking(&["alpha"]));
    h.add_project("alpha", true);
    h.start(h.config(ProjectFilter::All));

    let source = h.source.clone();
    wait_until(|| source.watch_calls() == 1).await;
    h.source.touch("alpha", "src/main.rs");

    wait_until(|| source.watch_calls() == 2).await;
    assert_eq!(h.vcs.attempts_for("alpha"), 1);
    assert!(h.reporter.logged("commit task for alpha panicked"));

    h.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_failing_project_does_not_block_others() {
    let mut h = Harness::new(FakeVcs::failing(&["alpha"]));
    h.add_project("alpha", true);
    h.add_project("beta", true);
    h.start(h.config(ProjectFilter::All));

    let source = h.source.clone();
    wait_until(|| source.watched().len() == 2).await;
    h.source.touch("alpha", "src/main.rs");
    h.source.touch("beta", "src/main.rs");

    tokio::time::sleep(Duration::from_secs(130)).await;
    assert_eq!(h.vcs.commits(), vec!["beta"]);
    assert_eq!(h.vcs.attempts_for("alpha"), 1);
    assert!(h.reporter.logged("Error in alpha:"));
    assert!(h.reporter.logged("Retrying in 10 minutes."));

    // beta keeps committing while alpha sits in backoff
    h.source.touch("beta", "src/lib.rs");
    tokio::time::sleep(Duration::from_secs(130)).await;
    assert_eq!(h.vcs.commits(), vec!["beta", "beta"]);
    assert_eq!(h.vcs.attempts_for("alpha"), 1);

    // Retry fires ten minutes after the first failure
    tokio::time::sleep(Duration::from_secs(480)).await;
    assert_eq!(h.vcs.attempts_for("alpha"), 2);

    h.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_retry_backoff() {
    let mut h = Harness::new(FakeVcs::failing(&["alpha"]));
    h.add_project("alpha", true);
    h.start(h.config(ProjectFilter::All));

    let source = h.source.clone();
    wait_until(|| source.watch_calls() == 1).await;
    h.source.touch("alpha", "src/main.rs");
    tokio::time::sleep(Duration::from_secs(130)).await;
    assert_eq!(h.vcs.attempts_for("alpha"), 1);

    let before = Instant::now();
    h.stop().await.unwrap();
    assert!(before.elapsed() < Duration::from_secs(1));
    assert_eq!(h.vcs.attempts_for("alpha"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unreadable_root_restarts_until_shutdown() {
    let mut h = Harness::new(FakeVcs::default());
    let mut config = h.config(ProjectFilter::All);
    config.projects_root = h.root.join("missing");
    h.start(config);

    let reporter = h.reporter.clone();
    wait_until(|| reporter.logged("Unexpected error: cannot read projects directory")).await;
    assert_eq!(h.source.watch_calls(), 0);

    // Shutdown lands during the restart pause
    let before = Instant::now();
    h.stop().await.unwrap();
    assert!(before.elapsed() < Duration::from_secs(10));
}
