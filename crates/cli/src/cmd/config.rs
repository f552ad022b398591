//! Configuration management command
//!
//! Provides CLI interface to view and edit the config file.

use anyhow::{Context, Result};
use autocommit_core::{config, ProjectFilter, Settings};
use owo_colors::OwoColorize;
use std::path::PathBuf;

/// List all configuration values
pub async fn run_list() -> Result<()> {
    let settings = config::load()?;
    let config_path = config::config_file_path()?;

    println!("{}", "Configuration".bold());
    println!("{}: {}\n", "Location".dimmed(), config_path.display().dimmed());

    println!(
        "{} = {}",
        "projects_dir".cyan(),
        match &settings.projects_dir {
            Some(dir) => dir.display().to_string(),
            None => "(not set)".dimmed().to_string(),
        }
    );
    println!("{} = {}", "projects".cyan(), display_filter(&settings.projects));

    let timing = &settings.timing;
    println!("\n{}", "[timing]".yellow());
    println!(
        "  {} = {} {}",
        "commit_delay_secs".cyan(),
        timing.commit_delay_secs,
        "(quiet period before committing)".dimmed()
    );
    println!(
        "  {} = {}",
        "check_interval_secs".cyan(),
        timing.check_interval_secs
    );
    println!(
        "  {} = {} {}",
        "retry_delay_secs".cyan(),
        timing.retry_delay_secs,
        format!("({} min)", timing.retry_delay_secs / 60).dimmed()
    );
    println!(
        "  {} = {}",
        "restart_pause_secs".cyan(),
        timing.restart_pause_secs
    );

    println!("\n{}", "[limits]".yellow());
    println!("  {} = {}", "size_limit_mb".cyan(), settings.limits.size_limit_mb);

    println!("\n{}", "[git]".yellow());
    println!("  {} = {}", "remote".cyan(), settings.git.remote);
    println!("  {} = {}", "branch".cyan(), settings.git.branch);

    println!("\n{}", "Valid Ranges:".bold());
    println!("  commit_delay_secs: 1-86400");
    println!("  check_interval_secs: 1-3600");
    println!("  retry_delay_secs: 1-86400");
    println!("  restart_pause_secs: 1-3600");
    println!("  size_limit_mb: 1-1,000,000");

    Ok(())
}

/// Get a single configuration value
pub async fn run_get(key: &str) -> Result<()> {
    let settings = config::load()?;
    println!("{}", get_value(&settings, key)?);
    Ok(())
}

/// Set a configuration value
pub async fn run_set(key: &str, value: &str) -> Result<()> {
    let mut settings = config::load()?;
    set_value(&mut settings, key, value)?;

    settings.validate().context("Invalid configuration value")?;
    config::save(&settings)?;

    println!("{} {} = {}", "✓".green(), key.cyan(), value);
    if crate::daemon::is_running() {
        println!(
            "{}",
            "Note: Restart daemon for changes to take effect (autocommit stop && autocommit start)"
                .yellow()
        );
    }

    Ok(())
}

/// Show the config file path and optionally create it
pub async fn run_path(create: bool) -> Result<()> {
    let config_path = config::config_file_path()?;

    if create && !config_path.exists() {
        config::init_if_missing()?;
        println!("{} Created config file at: {}", "✓".green(), config_path.display());
    } else if config_path.exists() {
        println!("{}", config_path.display());
    } else {
        println!("{}", config_path.display());
        println!("{}", "File does not exist. Use --create to create it.".yellow());
    }

    Ok(())
}

/// Show example configuration
pub async fn run_example() -> Result<()> {
    println!("{}", config::example_config());
    Ok(())
}

fn display_filter(filter: &ProjectFilter) -> String {
    match filter {
        ProjectFilter::All => "*".to_string(),
        ProjectFilter::Only(names) => names.join(","),
    }
}

fn get_value(settings: &Settings, key: &str) -> Result<String> {
    let value = match key {
        "projects_dir" => settings
            .projects_dir
            .as_ref()
            .map(|dir| dir.display().to_string())
            .unwrap_or_default(),
        "projects" => display_filter(&settings.projects),
        "timing.commit_delay_secs" => settings.timing.commit_delay_secs.to_string(),
        "timing.check_interval_secs" => settings.timing.check_interval_secs.to_string(),
        "timing.retry_delay_secs" => settings.timing.retry_delay_secs.to_string(),
        "timing.restart_pause_secs" => settings.timing.restart_pause_secs.to_string(),
        "limits.size_limit_mb" => settings.limits.size_limit_mb.to_string(),
        "git.remote" => settings.git.remote.clone(),
        "git.branch" => settings.git.branch.clone(),
        _ => anyhow::bail!(
            "Unknown config key: {}. Use 'autocommit config list' to see available keys.",
            key
        ),
    };
    Ok(value)
}

fn set_value(settings: &mut Settings, key: &str, value: &str) -> Result<()> {
    let seconds = || -> Result<u64> {
        value
            .parse()
            .context("Invalid value: must be a positive integer")
    };

    match key {
        "projects_dir" => {
            settings.projects_dir = if value.is_empty() {
                None
            } else {
                Some(PathBuf::from(value))
            };
        }
        "projects" => {
            let names = value
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect();
            settings.projects = ProjectFilter::from_names(names);
        }
        "timing.commit_delay_secs" => settings.timing.commit_delay_secs = seconds()?,
        "timing.check_interval_secs" => settings.timing.check_interval_secs = seconds()?,
        "timing.retry_delay_secs" => settings.timing.retry_delay_secs = seconds()?,
        "timing.restart_pause_secs" => settings.timing.restart_pause_secs = seconds()?,
        "limits.size_limit_mb" => settings.limits.size_limit_mb = seconds()?,
        "git.remote" => settings.git.remote = value.to_string(),
        "git.branch" => settings.git.branch = value.to_string(),
        _ => anyhow::bail!(
            "Unknown config key: {}. Use 'autocommit config list' to see available keys.",
            key
        ),
    }
    Ok(())
}
