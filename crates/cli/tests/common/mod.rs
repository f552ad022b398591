//! Common utilities for integration tests

pub mod cli;

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated config file, state directory and projects root
pub struct TestEnv {
    _temp_dir: TempDir,
    pub root: PathBuf,
    pub config_path: PathBuf,
    pub state_dir: PathBuf,
    pub projects_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        let projects_dir = root.join("projects");
        fs::create_dir_all(&projects_dir).expect("Failed to create projects dir");

        Self {
            config_path: root.join("config/config.toml"),
            state_dir: root.join("state"),
            projects_dir,
            root,
            _temp_dir: temp_dir,
        }
    }

    /// Command with the environment pointed at this sandbox
    pub fn command(&self, args: &[&str]) -> cli::AutocommitCommand {
        let mut cmd = cli::AutocommitCommand::new(&self.root);
        cmd.env("AUTOCOMMIT_CONFIG", &self.config_path.to_string_lossy())
            .env("AUTOCOMMIT_STATE_DIR", &self.state_dir.to_string_lossy())
            .args(args);
        cmd
    }

    /// Create a project directory, optionally with an ignore file
    pub fn add_project(&self, name: &str, with_ignore: bool) -> PathBuf {
        let dir = self.projects_dir.join(name);
        fs::create_dir_all(&dir).expect("Failed to create project");
        fs::write(dir.join("README.md"), format!("# {}\n", name)).expect("Failed to write file");
        if with_ignore {
            fs::write(dir.join(".gitignore"), "target/\n").expect("Failed to write .gitignore");
        }
        dir
    }

    pub fn write_config(&self, content: &str) {
        write_file(&self.config_path, content);
    }
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    fs::write(path, content).expect("Failed to write file");
}
