//! Error taxonomy for the monitor

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by configuration, discovery and the supervisor loop.
///
/// Per-project commit problems (missing ignore file, size limit, git failure)
/// are not errors here: they are reported as cycle outcomes and never leave the
/// project's own session.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// No projects root configured. Fatal to the monitor loop, never retried.
    #[error("projects directory is not configured (run `autocommit setup` first)")]
    ConfigMissing,

    #[error("cannot read projects directory {path}: {source}")]
    ProjectsRootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot write config file {path}: {source}")]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("invalid config value: {0}")]
    ConfigInvalid(String),

    #[error("could not determine a {0} directory for this platform")]
    NoPlatformDir(&'static str),

    #[error("failed to watch {path}: {reason}")]
    Watch { path: PathBuf, reason: String },

    /// Unexpected failure inside the running monitor. Triggers a full restart.
    #[error("supervisor fault: {0}")]
    SupervisorFault(String),
}

impl MonitorError {
    /// Whether the supervisor should tear down and rebuild after this error.
    pub fn is_restartable(&self) -> bool {
        !matches!(
            self,
            MonitorError::ConfigMissing
                | MonitorError::ConfigRead { .. }
                | MonitorError::ConfigParse { .. }
                | MonitorError::ConfigInvalid(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_fatal() {
        assert!(!MonitorError::ConfigMissing.is_restartable());
        assert!(!MonitorError::ConfigInvalid("x".into()).is_restartable());
        assert!(MonitorError::SupervisorFault("boom".into()).is_restartable());
        assert!(MonitorError::Watch {
            path: PathBuf::from("/tmp/p"),
            reason: "gone".into(),
        }
        .is_restartable());
    }
}
