//! Activity log and desktop notifications

use crate::logging::ACTIVITY_TARGET;
use autocommit_core::Reporter;
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Title shown on desktop notifications
pub const NOTIFICATION_TITLE: &str = "Git Automation Script";

/// [`Reporter`] writing to the activity log and the desktop notifier
///
/// Notifications go through `notify-send` on Linux and `osascript` on macOS.
/// A missing notifier is not an error; the message is still in the log.
#[derive(Debug, Clone)]
pub struct DesktopReporter {
    title: String,
    desktop: bool,
}

impl DesktopReporter {
    pub fn new() -> Self {
        Self {
            title: NOTIFICATION_TITLE.to_string(),
            desktop: true,
        }
    }

    /// Reporter that only logs, for headless runs
    pub fn log_only() -> Self {
        Self {
            desktop: false,
            ..Self::new()
        }
    }

    fn notifier_command(&self, message: &str) -> Option<Command> {
        if cfg!(target_os = "macos") {
            let script = format!(
                "display notification \"{}\" with title \"{}\"",
                escape_applescript(message),
                escape_applescript(&self.title)
            );
            let mut cmd = Command::new("osascript");
            cmd.arg("-e").arg(script);
            Some(cmd)
        } else if cfg!(target_os = "linux") {
            let mut cmd = Command::new("notify-send");
            cmd.arg(&self.title).arg(message);
            Some(cmd)
        } else {
            None
        }
    }
}

impl Default for DesktopReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for DesktopReporter {
    fn log(&self, message: &str) {
        info!(target: ACTIVITY_TARGET, "{}", message);
    }

    fn notify(&self, message: &str) {
        if !self.desktop {
            return;
        }
        let Some(mut cmd) = self.notifier_command(message) else {
            return;
        };

        // Fire and forget; the child is reaped by a detached thread
        match cmd
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(mut child) => {
                std::thread::spawn(move || {
                    let _ = child.wait();
                });
            }
            Err(e) => debug!("desktop notification unavailable: {}", e),
        }
    }
}

fn escape_applescript(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
