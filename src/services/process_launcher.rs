use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::models::launch_plan::StageKind;
use crate::utils::error::{LaunchError, Result};

/// A stage rendered into something the OS can run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchCommand {
    pub stage: StageKind,
    pub command_line: String,
    pub workdir: PathBuf,
    pub env: HashMap<String, String>,
}

/// Result of a stage that ran to completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageOutcome {
    pub stage: StageKind,
    /// `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl StageOutcome {
    pub const fn success(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }
}

/// Boundary between the sequencer and the operating system
pub trait ProcessLauncher {
    /// Run the command and wait for it to exit
    fn run_to_completion(
        &self,
        command: &LaunchCommand,
    ) -> impl Future<Output = Result<StageOutcome>> + Send;

    /// Start the command in the background and forget about it; returns the pid
    fn spawn_detached(&self, command: &LaunchCommand) -> Result<u32>;

    /// Replace the current process with the command; only returns on failure
    fn replace_process(&self, command: &LaunchCommand) -> Result<Infallible>;
}

/// Shell used to interpret stage command lines
fn shell_invocation(command_line: &str) -> (&'static str, [&str; 2]) {
    if cfg!(target_os = "windows") {
        ("cmd", ["/C", command_line])
    } else {
        ("sh", ["-c", command_line])
    }
}

fn std_command(command: &LaunchCommand) -> std::process::Command {
    let (program, args) = shell_invocation(&command.command_line);
    let mut cmd = std::process::Command::new(program);
    cmd.args(args)
        .current_dir(&command.workdir)
        .envs(&command.env);
    cmd
}

/// Launcher backed by real OS processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl SystemLauncher {
    pub const fn new() -> Self {
        Self
    }
}

impl ProcessLauncher for SystemLauncher {
    async fn run_to_completion(&self, command: &LaunchCommand) -> Result<StageOutcome> {
        let (program, args) = shell_invocation(&command.command_line);
        let started_at = Utc::now();
        let timer = Instant::now();

        debug!(stage = %command.stage, command = %command.command_line, "Running to completion");

        let status = tokio::process::Command::new(program)
            .args(args)
            .current_dir(&command.workdir)
            .envs(&command.env)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|source| LaunchError::Spawn {
                stage: command.stage,
                source,
            })?;

        Ok(StageOutcome {
            stage: command.stage,
            exit_code: status.code(),
            started_at,
            duration_ms: u64::try_from(timer.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }

    fn spawn_detached(&self, command: &LaunchCommand) -> Result<u32> {
        let mut cmd = std_command(command);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // Own process group so terminal signals aimed at the launcher skip it
            cmd.process_group(0);
        }

        let child = cmd.spawn().map_err(|source| LaunchError::Spawn {
            stage: command.stage,
            source,
        })?;

        let pid = child.id();
        drop(child);
        Ok(pid)
    }

    #[cfg(unix)]
    fn replace_process(&self, command: &LaunchCommand) -> Result<Infallible> {
        use std::os::unix::process::CommandExt;

        let source = std_command(command).exec();
        Err(LaunchError::Exec { source })
    }

    #[cfg(not(unix))]
    fn replace_process(&self, command: &LaunchCommand) -> Result<Infallible> {
        // No exec on this platform: run in the foreground and mirror its exit code
        let status = std_command(command)
            .status()
            .map_err(|source| LaunchError::Exec { source })?;
        std::process::exit(status.code().unwrap_or(1));
    }
}
