//! Daemon lifecycle management

use crate::locks::{self, DaemonLock, LockContent};
use anyhow::{Context, Result};
use autocommit_cli::{DesktopReporter, Supervisor};
use autocommit_core::{config, MonitorError, Reporter};
use autocommit_git::GitCli;
use autocommit_watcher::NotifySource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

/// How long `stop` waits for the daemon to exit after SIGTERM
const STOP_TIMEOUT: Duration = Duration::from_secs(40);

/// Run the monitor in this process until SIGINT or SIGTERM
pub async fn start() -> Result<()> {
    let reporter = Arc::new(DesktopReporter::new());

    if config::init_if_missing()? {
        info!("created config file at {}", config::config_file_path()?.display());
    }
    let settings = config::load()?;
    let monitor = match settings.monitor_config() {
        Ok(monitor) => monitor,
        Err(e @ MonitorError::ConfigMissing) => {
            reporter.log(&format!("Cannot start: {}", e));
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    let state_dir = config::state_dir()?;
    let lock = DaemonLock::acquire(&state_dir)?;
    reporter.log("Script started");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    let vcs = Arc::new(GitCli::new(settings.git.remote, settings.git.branch));
    let supervisor = Supervisor::new(monitor, vcs, reporter.clone(), Box::new(NotifySource::new()));
    let result = supervisor.run(shutdown_rx).await;

    reporter.log("Script stopped");
    lock.release()?;
    result.context("Monitor stopped with an error")
}

/// Signal the running daemon and wait for it to exit
pub async fn stop() -> Result<()> {
    let state_dir = config::state_dir()?;
    let Some(holder) = locks::holder(&state_dir) else {
        println!("Daemon is not running");
        return Ok(());
    };

    send_terminate(holder.pid)?;

    let deadline = tokio::time::Instant::now() + STOP_TIMEOUT;
    while tokio::time::Instant::now() < deadline {
        if !locks::is_process_alive(holder.pid) {
            println!("Daemon stopped (pid {})", holder.pid);
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    anyhow::bail!(
        "Daemon (pid {}) did not stop within {} seconds",
        holder.pid,
        STOP_TIMEOUT.as_secs()
    )
}

/// Lock content of the running daemon
pub fn running() -> Option<LockContent> {
    let state_dir = config::state_dir().ok()?;
    locks::holder(&state_dir)
}

pub fn is_running() -> bool {
    running().is_some()
}

#[cfg(unix)]
fn send_terminate(pid: u32) -> Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let raw = i32::try_from(pid).context("Invalid pid in lock file")?;
    kill(Pid::from_raw(raw), Signal::SIGTERM)
        .with_context(|| format!("Failed to signal daemon (pid {})", pid))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("cannot listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
