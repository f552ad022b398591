//! Monitor supervisor
//!
//! Owns one generation of watch sessions at a time: discovers projects,
//! registers them with the change source, and ticks every `check_interval`
//! to start commit cycles for sessions that have gone quiet. Each cycle runs
//! as its own task so one project's push or retry backoff never delays the
//! others.
//!
//! A fault from the change source or a panicked commit task tears the whole
//! generation down. After `restart_pause` the projects are rediscovered and
//! a fresh generation is built; configuration errors end the run instead.

use autocommit_core::{discover_projects, MonitorConfig, MonitorError, Reporter, VersionControl};
use autocommit_watcher::{ChangeSink, ChangeSource, SourceFault, WatchSession};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// How long teardown waits for in-flight commits before aborting them
const TEARDOWN_GRACE: Duration = Duration::from_secs(30);

/// Everything that belongs to one build of the monitor
struct Generation {
    sessions: Vec<Arc<WatchSession>>,
    /// Running commit cycles keyed by project name
    tasks: HashMap<String, JoinHandle<()>>,
    faults: mpsc::UnboundedReceiver<SourceFault>,
    /// Keeps `faults` open when no project is watched
    _fault_tx: mpsc::UnboundedSender<SourceFault>,
    stop_tx: watch::Sender<bool>,
}

/// Supervises watch sessions for every monitored project
pub struct Supervisor {
    config: MonitorConfig,
    vcs: Arc<dyn VersionControl>,
    reporter: Arc<dyn Reporter>,
    source: Box<dyn ChangeSource>,
}

impl Supervisor {
    pub fn new(
        config: MonitorConfig,
        vcs: Arc<dyn VersionControl>,
        reporter: Arc<dyn Reporter>,
        source: Box<dyn ChangeSource>,
    ) -> Self {
        Self {
            config,
            vcs,
            reporter,
            source,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Run until `shutdown` becomes true
    ///
    /// Returns `Ok` on a requested shutdown. Errors that a rebuild cannot fix
    /// (see [`MonitorError::is_restartable`]) end the run; anything else is
    /// reported and followed by a restart.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), MonitorError> {
        self.reporter.log(&format!(
            "Starting to monitor projects in {}",
            self.config.projects_root.display()
        ));

        loop {
            let err = match self.run_generation(&mut shutdown).await {
                Ok(()) => {
                    info!("monitor stopped");
                    return Ok(());
                }
                Err(err) => err,
            };

            if !err.is_restartable() {
                let text = format!("Fatal error: {}. Monitor stopped.", err);
                self.reporter.log(&text);
                self.reporter.notify(&text);
                return Err(err);
            }

            let text = format!("Unexpected error: {}. Restarting monitor.", err);
            self.reporter.log(&text);
            self.reporter.notify(&text);

            tokio::select! {
                _ = tokio::time::sleep(self.config.restart_pause) => {}
                _ = wait_for_shutdown(&mut shutdown) => {
                    info!("shutdown requested during restart pause");
                    return Ok(());
                }
            }
        }
    }

    /// Build, tick and tear down one generation
    async fn run_generation(
        &mut self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), MonitorError> {
        let mut generation = self.build()?;
        let result = self.tick_loop(&mut generation, shutdown).await;
        self.teardown(generation).await;
        result
    }

    fn build(&mut self) -> Result<Generation, MonitorError> {
        let projects = discover_projects(&self.config.projects_root, &self.config.filter)?;
        let (fault_tx, faults) = mpsc::unbounded_channel();
        let (stop_tx, _) = watch::channel(false);

        let mut sessions = Vec::with_capacity(projects.len());
        for project in projects {
            let session = Arc::new(WatchSession::new(project, self.config.session));
            if let Err(e) = self.source.watch(ChangeSink::new(session.clone(), fault_tx.clone())) {
                self.source.unwatch_all();
                return Err(e);
            }
            self.reporter
                .log(&format!("Monitoring project: {}", session.project().name));
            sessions.push(session);
        }

        if sessions.is_empty() {
            warn!(
                "no projects to monitor under {}",
                self.config.projects_root.display()
            );
        }
        let text = format!("Git automation is now running ({} projects).", sessions.len());
        self.reporter.log(&text);
        self.reporter.notify(&text);

        Ok(Generation {
            sessions,
            tasks: HashMap::new(),
            faults,
            _fault_tx: fault_tx,
            stop_tx,
        })
    }

    async fn tick_loop(
        &mut self,
        generation: &mut Generation,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), MonitorError> {
        let mut ticker = tokio::time::interval(self.config.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => self.check_sessions(generation).await?,
                Some(fault) = generation.faults.recv() => {
                    return Err(MonitorError::SupervisorFault(format!(
                        "change source for {} failed: {}",
                        fault.project, fault.reason
                    )));
                }
                _ = wait_for_shutdown(shutdown) => return Ok(()),
            }
        }
    }

    /// Reap finished commit tasks and start cycles for due sessions
    async fn check_sessions(&mut self, generation: &mut Generation) -> Result<(), MonitorError> {
        let finished: Vec<String> = generation
            .tasks
            .iter()
            .filter(|(_, task)| task.is_finished())
            .map(|(name, _)| name.clone())
            .collect();
        for name in finished {
            if let Some(task) = generation.tasks.remove(&name) {
                if let Err(e) = task.await {
                    if e.is_panic() {
                        return Err(MonitorError::SupervisorFault(format!(
                            "commit task for {} panicked",
                            name
                        )));
                    }
                }
            }
        }

        let now = Instant::now();
        for session in &generation.sessions {
            if !session.try_begin_commit(now) {
                continue;
            }
            let name = session.project().name.clone();
            debug!(project = %name, "project quiet, starting commit cycle");
            let task = tokio::spawn(session.clone().run_commit_cycle(
                self.vcs.clone(),
                self.reporter.clone(),
                generation.stop_tx.subscribe(),
            ));
            generation.tasks.insert(name, task);
        }
        Ok(())
    }

    /// Stop watching, cancel retry backoffs and wait for in-flight commits
    async fn teardown(&mut self, generation: Generation) {
        self.source.unwatch_all();
        let _ = generation.stop_tx.send(true);

        let deadline = Instant::now() + TEARDOWN_GRACE;
        for (name, mut task) in generation.tasks {
            if tokio::time::timeout_at(deadline, &mut task).await.is_err() {
                warn!(project = %name, "commit still running at teardown, aborting");
                task.abort();
            }
        }
        debug!("generation torn down");
    }
}

/// Resolves once `shutdown` holds true or its sender is gone
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
