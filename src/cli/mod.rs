// CLI module for command-line interface

pub mod init;
pub mod plan;
pub mod prepare;
pub mod start;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::models::launch_plan::LaunchPlan;
use crate::utils::config::{get_default_config_path, ConfigParser};
use crate::utils::error::{LaunchError, Result};

use self::init::InitCommand;
use self::plan::PlanCommand;
use self::prepare::PrepareCommand;
use self::start::StartCommand;

/// Main CLI structure
#[derive(Parser)]
#[command(name = "launchseq")]
#[command(about = "Container entrypoint: initialize, start the worker, exec the web server")]
#[command(long_about = r#"launchseq brings an application container up in three stages:

  1. run the database initializer to completion
  2. start the task-queue worker in the background
  3. replace itself with the web server process

Stages are described in launch.toml. Without that file the built-in plan runs
`python init_db.py`, a Celery worker and uvicorn on 0.0.0.0:8000.

Examples:
  launchseq start                      Bring the container up
  launchseq start --port 9000          Override the server port
  launchseq plan --json                Show what start would run
  launchseq init                       Write a launch.toml with the defaults"#)]
#[command(version)]
pub struct Cli {
    /// Launch file (default: launch.toml, optional)
    #[arg(long, global = true, env = "LAUNCHSEQ_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// All available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the full launch sequence
    #[command(long_about = r#"Run the full launch sequence.

Creates the required directories, runs the initializer, starts the worker
detached and finally execs the server so it inherits this process ID and
receives termination signals directly.

A failing initializer is logged and startup continues, unless the launch file
sets on_init_failure = "abort" or --strict is given.

The bind comes from --port/--host, then LAUNCH_PORT/LAUNCH_HOST, then the
application's API_PORT/API_HOST, then the launch file.

Examples:
  launchseq start
  launchseq start --strict
  launchseq start --skip-worker --port 8080"#)]
    Start {
        /// Server port, substituted for {port}
        #[arg(long, env = "LAUNCH_PORT")]
        port: Option<u16>,
        /// Server host, substituted for {host}
        #[arg(long, env = "LAUNCH_HOST")]
        host: Option<String>,
        /// Port from the application's own settings, used when --port is unset
        #[arg(long, env = "API_PORT", hide = true)]
        api_port: Option<u16>,
        /// Host from the application's own settings, used when --host is unset
        #[arg(long, env = "API_HOST", hide = true)]
        api_host: Option<String>,
        /// Abort if the initializer fails
        #[arg(long)]
        strict: bool,
        /// Do not run the initializer
        #[arg(long)]
        skip_init: bool,
        /// Do not start the worker
        #[arg(long)]
        skip_worker: bool,
    },

    /// Show the resolved launch plan without running it
    Plan {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create the directories the application expects
    Prepare {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a launch file with the default plan
    Init {
        /// Launch name (default: current directory name)
        #[arg(long)]
        name: Option<String>,
        /// Overwrite an existing launch file
        #[arg(long)]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Where the launch file lives and whether the user named it
#[derive(Debug, Clone)]
pub struct ConfigLocation {
    pub path: PathBuf,
    pub explicit: bool,
}

impl ConfigLocation {
    pub fn new(config: Option<PathBuf>) -> Self {
        match config {
            Some(path) => Self {
                path,
                explicit: true,
            },
            None => Self {
                path: get_default_config_path(),
                explicit: false,
            },
        }
    }

    pub fn load(&self) -> Result<LaunchPlan> {
        ConfigParser::load_or_default(&self.path, self.explicit)
    }
}

pub(crate) fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().map_err(LaunchError::Io)
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| LaunchError::Config(format!("JSON serialization error: {e}")))?;
    println!("{text}");
    Ok(())
}

pub(crate) fn display_path(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// CLI command dispatcher
pub struct CliDispatcher;

impl CliDispatcher {
    /// Execute a CLI command
    pub async fn execute(cli: Cli) -> Result<()> {
        let location = ConfigLocation::new(cli.config);

        match cli.command {
            Commands::Start {
                port,
                host,
                api_port,
                api_host,
                strict,
                skip_init,
                skip_worker,
            } => {
                let cmd = StartCommand {
                    location,
                    port: port.or(api_port),
                    host: host.or(api_host),
                    strict,
                    skip_init,
                    skip_worker,
                };
                cmd.run().await
            }

            Commands::Plan { json } => {
                let cmd = PlanCommand { location, json };
                cmd.run()
            }

            Commands::Prepare { json } => {
                let cmd = PrepareCommand { location, json };
                cmd.run()
            }

            Commands::Init { name, force, json } => {
                let cmd = InitCommand {
                    location,
                    name,
                    force,
                    json,
                };
                cmd.run()
            }
        }
    }
}
