//! Configure the projects directory

use anyhow::{Context, Result};
use autocommit_core::{config, discover_projects};
use owo_colors::OwoColorize;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

pub async fn run(path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => prompt_for_directory()?,
    };

    let expanded = expand_home(&path);
    if !expanded.is_dir() {
        anyhow::bail!("Not a directory: {}", expanded.display());
    }
    let projects_dir = expanded
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", expanded.display()))?;

    let mut settings = config::load()?;
    settings.projects_dir = Some(projects_dir.clone());
    config::save(&settings)?;

    println!(
        "{} Projects directory set to {}",
        "✓".green(),
        projects_dir.display().to_string().cyan()
    );

    let projects = discover_projects(&projects_dir, &settings.projects)?;
    if projects.is_empty() {
        println!(
            "{}",
            "No subdirectories with a .gitignore yet; add one to a project to monitor it".yellow()
        );
    } else {
        println!("{} projects will be monitored:", projects.len());
        for project in &projects {
            println!("  {}", project.name);
        }
    }
    println!("{}", "Start monitoring with 'autocommit start'".dimmed());

    Ok(())
}

fn prompt_for_directory() -> Result<PathBuf> {
    print!("Enter the path to your projects directory: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;

    let line = line.trim();
    if line.is_empty() {
        anyhow::bail!("No directory given");
    }
    Ok(PathBuf::from(line))
}

/// Expand a leading `~` to the home directory
fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
