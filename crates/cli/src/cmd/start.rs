//! Start the autocommit daemon

use anyhow::{Context, Result};
use autocommit_core::config;
use std::time::Duration;

pub async fn run(foreground: bool) -> Result<()> {
    if foreground {
        crate::daemon::start().await
    } else {
        start_background().await
    }
}

async fn start_background() -> Result<()> {
    use std::process::Command;

    if let Some(holder) = crate::daemon::running() {
        println!("Daemon already running (pid {})", holder.pid);
        return Ok(());
    }

    // Fail here rather than in a detached process nobody is watching
    let settings = config::load()?;
    settings.monitor_config()?;

    let state_dir = config::state_dir()?;
    std::fs::create_dir_all(&state_dir).context("Failed to create state directory")?;
    let log_file = state_dir.join("daemon.log");

    let exe = std::env::current_exe().context("Failed to get current executable path")?;

    let log_file_writer = std::fs::File::create(&log_file).context("Failed to create log file")?;

    Command::new("nohup")
        .arg(&exe)
        .arg("start")
        .arg("--foreground")
        .stdout(log_file_writer.try_clone()?)
        .stderr(log_file_writer)
        .spawn()
        .context("Failed to spawn daemon process")?;

    // Wait a moment to verify it started
    tokio::time::sleep(Duration::from_millis(500)).await;

    if crate::daemon::is_running() {
        println!("Daemon started successfully");
        println!("Logs: {}", log_file.display());
        Ok(())
    } else {
        anyhow::bail!(
            "Daemon failed to start (check logs at {})",
            log_file.display()
        );
    }
}
