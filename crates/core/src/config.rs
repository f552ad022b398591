//! Configuration file management
//!
//! The config file lives at `$AUTOCOMMIT_CONFIG` or, by default,
//! `<config dir>/autocommit/config.toml`. The daemon reads it once at startup;
//! edits take effect on the next restart.

use crate::{MonitorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment override for the config file location
pub const CONFIG_ENV: &str = "AUTOCOMMIT_CONFIG";

/// Environment override for the state directory (logs, lock file)
pub const STATE_DIR_ENV: &str = "AUTOCOMMIT_STATE_DIR";

const APP_DIR: &str = "autocommit";

/// On-disk configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Directory whose immediate subdirectories are candidate projects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects_dir: Option<PathBuf>,

    /// Which projects to monitor: `"*"` or a list of directory names
    #[serde(default)]
    pub projects: ProjectFilter,

    #[serde(default)]
    pub timing: TimingConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub git: GitConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Quiet period after the last change before a commit (default: 60)
    #[serde(default = "default_commit_delay")]
    pub commit_delay_secs: u64,

    /// Interval between debounce checks (default: 60)
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    /// Wait before re-attempting a failed commit (default: 600)
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,

    /// Pause before rebuilding the monitor after a fault (default: 10)
    #[serde(default = "default_restart_pause")]
    pub restart_pause_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum total size of tracked files per project (default: 150)
    #[serde(default = "default_size_limit")]
    pub size_limit_mb: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitConfig {
    #[serde(default = "default_remote")]
    pub remote: String,

    #[serde(default = "default_branch")]
    pub branch: String,
}

fn default_commit_delay() -> u64 {
    60
}

fn default_check_interval() -> u64 {
    60
}

fn default_retry_delay() -> u64 {
    600
}

fn default_restart_pause() -> u64 {
    10
}

fn default_size_limit() -> u64 {
    150
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            commit_delay_secs: default_commit_delay(),
            check_interval_secs: default_check_interval(),
            retry_delay_secs: default_retry_delay(),
            restart_pause_secs: default_restart_pause(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            size_limit_mb: default_size_limit(),
        }
    }
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            remote: default_remote(),
            branch: default_branch(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            projects_dir: None,
            projects: ProjectFilter::All,
            timing: TimingConfig::default(),
            limits: LimitsConfig::default(),
            git: GitConfig::default(),
        }
    }
}

/// Project name filter
///
/// Serialized as a list of names; a `"*"` entry (or a bare `"*"` string)
/// selects every qualifying directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawFilter", into = "Vec<String>")]
pub enum ProjectFilter {
    #[default]
    All,
    Only(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFilter {
    One(String),
    Many(Vec<String>),
}

impl From<RawFilter> for ProjectFilter {
    fn from(raw: RawFilter) -> Self {
        match raw {
            RawFilter::One(name) => ProjectFilter::from_names(vec![name]),
            RawFilter::Many(names) => ProjectFilter::from_names(names),
        }
    }
}

impl From<ProjectFilter> for Vec<String> {
    fn from(filter: ProjectFilter) -> Self {
        match filter {
            ProjectFilter::All => vec!["*".to_string()],
            ProjectFilter::Only(names) => names,
        }
    }
}

impl ProjectFilter {
    pub fn from_names(names: Vec<String>) -> Self {
        if names.iter().any(|n| n == "*") {
            ProjectFilter::All
        } else {
            ProjectFilter::Only(names)
        }
    }

    /// Check whether a project directory name is selected
    pub fn matches(&self, name: &str) -> bool {
        match self {
            ProjectFilter::All => true,
            ProjectFilter::Only(names) => names.iter().any(|n| n == name),
        }
    }
}

/// Per-session timing and limits, resolved from [`Settings`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub commit_delay: Duration,
    pub retry_delay: Duration,
    pub size_limit_bytes: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Settings::default().session_settings()
    }
}

/// Immutable view of the configuration handed to the supervisor
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub projects_root: PathBuf,
    pub filter: ProjectFilter,
    pub session: SessionSettings,
    pub check_interval: Duration,
    pub restart_pause: Duration,
}

impl Settings {
    /// Resolve the supervisor's view of the configuration
    ///
    /// Fails with [`MonitorError::ConfigMissing`] when no projects directory
    /// has been configured.
    pub fn monitor_config(&self) -> Result<MonitorConfig> {
        let projects_root = match &self.projects_dir {
            Some(dir) if !dir.as_os_str().is_empty() => dir.clone(),
            _ => return Err(MonitorError::ConfigMissing),
        };

        Ok(MonitorConfig {
            projects_root,
            filter: self.projects.clone(),
            session: self.session_settings(),
            check_interval: Duration::from_secs(self.timing.check_interval_secs),
            restart_pause: Duration::from_secs(self.timing.restart_pause_secs),
        })
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            commit_delay: Duration::from_secs(self.timing.commit_delay_secs),
            retry_delay: Duration::from_secs(self.timing.retry_delay_secs),
            size_limit_bytes: self.limits.size_limit_mb * 1024 * 1024,
        }
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        let t = &self.timing;
        check_range("timing.commit_delay_secs", t.commit_delay_secs, 1, 86_400)?;
        check_range("timing.check_interval_secs", t.check_interval_secs, 1, 3_600)?;
        check_range("timing.retry_delay_secs", t.retry_delay_secs, 1, 86_400)?;
        check_range("timing.restart_pause_secs", t.restart_pause_secs, 1, 3_600)?;
        check_range("limits.size_limit_mb", self.limits.size_limit_mb, 1, 1_000_000)?;

        if self.git.remote.trim().is_empty() {
            return Err(MonitorError::ConfigInvalid("git.remote must not be empty".into()));
        }
        if self.git.branch.trim().is_empty() {
            return Err(MonitorError::ConfigInvalid("git.branch must not be empty".into()));
        }
        if let ProjectFilter::Only(names) = &self.projects {
            if names.iter().any(|n| n.contains(std::path::MAIN_SEPARATOR)) {
                return Err(MonitorError::ConfigInvalid(
                    "projects entries must be directory names, not paths".into(),
                ));
            }
        }
        Ok(())
    }
}

fn check_range(key: &str, value: u64, min: u64, max: u64) -> Result<()> {
    if value < min || value > max {
        return Err(MonitorError::ConfigInvalid(format!(
            "{} = {} (expected {}-{})",
            key, value, min, max
        )));
    }
    Ok(())
}

/// Location of the config file
pub fn config_file_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join("config.toml"))
        .ok_or(MonitorError::NoPlatformDir("config"))
}

/// Directory holding the activity log, daemon log and lock file
pub fn state_dir() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(STATE_DIR_ENV) {
        return Ok(PathBuf::from(path));
    }
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR))
        .ok_or(MonitorError::NoPlatformDir("data"))
}

/// Load settings from the default location
pub fn load() -> Result<Settings> {
    load_from(&config_file_path()?)
}

/// Load settings from a file; a missing file yields defaults
pub fn load_from(path: &Path) -> Result<Settings> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Settings::default());
    }

    let content = std::fs::read_to_string(path).map_err(|source| MonitorError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let settings: Settings = toml::from_str(&content).map_err(|source| MonitorError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;
    settings.validate()?;
    Ok(settings)
}

/// Save settings to the default location
pub fn save(settings: &Settings) -> Result<()> {
    save_to(&config_file_path()?, settings)
}

pub fn save_to(path: &Path, settings: &Settings) -> Result<()> {
    let content = toml::to_string_pretty(settings)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| MonitorError::ConfigWrite {
            path: path.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, content).map_err(|source| MonitorError::ConfigWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the initial config file if none exists. Returns true if created.
pub fn init_if_missing() -> Result<bool> {
    let path = config_file_path()?;
    if path.exists() {
        return Ok(false);
    }
    save_to(&path, &Settings::default())?;
    tracing::info!(path = %path.display(), "initial config created");
    Ok(true)
}

/// Annotated example configuration
pub fn example_config() -> &'static str {
    r#"# autocommit configuration

# Directory containing your projects (one subdirectory per repository)
projects_dir = "/home/me/code"

# "*" monitors every subdirectory that has a .gitignore,
# otherwise list directory names explicitly
projects = ["*"]

[timing]
# Quiet period after the last change before committing
commit_delay_secs = 60
# How often pending projects are checked
check_interval_secs = 60
# Wait before retrying a failed commit or push
retry_delay_secs = 600
# Pause before the monitor rebuilds itself after an unexpected error
restart_pause_secs = 10

[limits]
# Projects larger than this (excluding ignored paths) are never pushed
size_limit_mb = 150

[git]
remote = "origin"
branch = "main"
"#
}
