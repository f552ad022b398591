//! Show daemon and project status

use crate::util;
use anyhow::Result;
use autocommit_core::{config, discover_projects, ProjectFilter};
use autocommit_watcher::{tracked_size, IgnoreRules};
use owo_colors::OwoColorize;

pub async fn run() -> Result<()> {
    let config_path = config::config_file_path()?;
    let settings = config::load()?;

    println!("{}", "Autocommit Status".bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();

    println!("Config:        {}", config_path.display().to_string().dimmed());

    print!("Daemon:        ");
    match crate::daemon::running() {
        Some(holder) => {
            println!("{}", "Running ✓".green());
            println!("  PID:         {}", holder.pid);
            println!("  Uptime:      {}", util::format_uptime(holder.started_at));
        }
        None => {
            println!("{}", "Not running".yellow());
            println!("  {}", "Tip: Start with 'autocommit start'".dimmed());
        }
    }
    println!();

    let Some(projects_dir) = settings.projects_dir.as_ref() else {
        println!("Projects:      {}", "not configured".red());
        println!("  {}", "Tip: Run 'autocommit setup <dir>'".dimmed());
        return Ok(());
    };
    println!("Projects:      {}", projects_dir.display().to_string().cyan());
    match &settings.projects {
        ProjectFilter::All => println!("Filter:        all subdirectories"),
        ProjectFilter::Only(names) => println!("Filter:        {}", names.join(", ")),
    }
    println!();

    let projects = match discover_projects(projects_dir, &settings.projects) {
        Ok(projects) => projects,
        Err(e) => {
            println!("{} {}", "✗".red(), e);
            return Ok(());
        }
    };

    if projects.is_empty() {
        println!("{}", "No projects with a .gitignore found".yellow());
        return Ok(());
    }

    let limit = settings.session_settings().size_limit_bytes;
    println!("Monitored projects ({}):", projects.len());
    for project in projects {
        let rules = IgnoreRules::load(&project.path);
        let size = tracked_size(&rules);
        let size_str = util::format_size(size);
        if size > limit {
            println!(
                "  {:<24} {} {}",
                project.name,
                size_str.red(),
                "(over size limit, will not be pushed)".red()
            );
        } else {
            println!("  {:<24} {}", project.name, size_str.dimmed());
        }
    }

    Ok(())
}
