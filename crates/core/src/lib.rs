//! Shared types for autocommit
//!
//! This crate provides:
//! - Configuration file model and loading (`config.toml`)
//! - Project discovery under the configured root
//! - The error taxonomy shared by the watcher and the daemon
//! - Collaborator seams: version control and reporting

pub mod config;
pub mod error;
pub mod project;
pub mod report;
pub mod vcs;

// Re-exports
pub use config::{MonitorConfig, ProjectFilter, SessionSettings, Settings};
pub use error::MonitorError;
pub use project::{discover_projects, Project, IGNORE_FILE};
pub use report::{Reporter, ACTIVITY_TARGET};
pub use vcs::{VcsError, VersionControl};

/// Result type for core operations
pub type Result<T> = std::result::Result<T, MonitorError>;
