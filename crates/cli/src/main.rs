//! autocommit - commit and push project directories after they go quiet

use anyhow::Result;
use autocommit_cli::logging;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;
mod daemon;
mod locks;
mod util;

/// Watches your projects and commits + pushes them once edits settle
#[derive(Parser)]
#[command(name = "autocommit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output (debug-level logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the daemon
    Start {
        /// Run in foreground (for debugging)
        #[arg(long)]
        foreground: bool,
    },
    /// Stop the daemon
    Stop,
    /// Show daemon and project status
    Status,
    /// Set the projects directory
    Setup {
        /// Directory containing your projects (prompted if omitted)
        path: Option<PathBuf>,
    },
    /// View and edit configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// List all configuration values
    List,
    /// Get a single value (e.g. timing.commit_delay_secs)
    Get {
        key: String,
    },
    /// Set a single value
    Set {
        key: String,
        value: String,
    },
    /// Show the config file path
    Path {
        /// Create the file with defaults if missing
        #[arg(long)]
        create: bool,
    },
    /// Print an annotated example configuration
    Example,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Only the foreground daemon writes the activity log
    let activity_dir = match cli.command {
        Commands::Start { foreground: true } => Some(autocommit_core::config::state_dir()?),
        _ => None,
    };
    let _log_guard = logging::init(activity_dir.as_deref(), cli.verbose)?;

    match cli.command {
        Commands::Start { foreground } => cmd::start::run(foreground).await,
        Commands::Stop => cmd::stop::run().await,
        Commands::Status => cmd::status::run().await,
        Commands::Setup { path } => cmd::setup::run(path).await,
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::List => cmd::config::run_list().await,
            ConfigCommands::Get { key } => cmd::config::run_get(&key).await,
            ConfigCommands::Set { key, value } => cmd::config::run_set(&key, &value).await,
            ConfigCommands::Path { create } => cmd::config::run_path(create).await,
            ConfigCommands::Example => cmd::config::run_example().await,
        },
    }
}
