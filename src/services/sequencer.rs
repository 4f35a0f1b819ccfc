use std::convert::Infallible;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::models::launch_plan::{FailurePolicy, LaunchPlan, Stage};
use crate::services::process_launcher::{LaunchCommand, ProcessLauncher, StageOutcome};
use crate::utils::error::{LaunchError, Result};

/// Runs a launch plan: directories, initializer, detached worker, then exec of the server.
///
/// Banners go to `out` (stdout by default) so they land in the container log in
/// order; diagnostics go through `tracing`.
pub struct Sequencer<L: ProcessLauncher, W: Write = io::Stdout> {
    plan: LaunchPlan,
    launcher: L,
    workdir: PathBuf,
    out: W,
}

impl<L: ProcessLauncher> Sequencer<L> {
    /// Sequencer writing banners to stdout; relative workdirs resolve against `base_dir`
    pub fn new(plan: LaunchPlan, launcher: L, base_dir: &Path) -> Self {
        Self::with_output(plan, launcher, base_dir, io::stdout())
    }
}

impl<L: ProcessLauncher, W: Write> Sequencer<L, W> {
    pub fn with_output(plan: LaunchPlan, launcher: L, base_dir: &Path, out: W) -> Self {
        let workdir = plan.resolved_workdir(base_dir);
        Self {
            plan,
            launcher,
            workdir,
            out,
        }
    }

    pub const fn plan(&self) -> &LaunchPlan {
        &self.plan
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub const fn launcher(&self) -> &L {
        &self.launcher
    }

    pub const fn output(&self) -> &W {
        &self.out
    }

    /// Stage rendered with bind placeholders, workdir and merged environment
    pub fn command_for(&self, stage: &Stage) -> LaunchCommand {
        LaunchCommand {
            stage: stage.kind,
            command_line: stage.render(&self.plan.bind),
            workdir: self.workdir.clone(),
            env: self.plan.stage_environment(stage, &self.workdir),
        }
    }

    fn announce(&mut self, stage: &Stage) -> Result<()> {
        writeln!(self.out, "{}", stage.banner)?;
        self.out.flush()?;
        Ok(())
    }

    /// Create the required directories that are missing; returns the ones created
    pub fn prepare_directories(&self) -> Result<Vec<PathBuf>> {
        let mut created = Vec::new();
        for dir in self.plan.resolved_directories(&self.workdir) {
            if dir.is_dir() {
                debug!(path = %dir.display(), "Directory already present");
                continue;
            }
            std::fs::create_dir_all(&dir)?;
            info!(path = %dir.display(), "Created directory");
            created.push(dir);
        }
        Ok(created)
    }

    /// Run the initializer to completion; the failure policy decides whether a bad exit stops the launch
    pub async fn run_initializer(&mut self) -> Result<Option<StageOutcome>> {
        let Some(stage) = self.plan.initializer.clone() else {
            debug!("No initializer configured");
            return Ok(None);
        };

        self.announce(&stage)?;
        let command = self.command_for(&stage);
        let policy = self.plan.on_init_failure;

        match self.launcher.run_to_completion(&command).await {
            Ok(outcome) if outcome.success() => {
                info!(
                    stage = %stage.kind,
                    duration_ms = outcome.duration_ms,
                    "Initializer finished"
                );
                Ok(Some(outcome))
            }
            Ok(outcome) => match policy {
                FailurePolicy::Continue => {
                    warn!(
                        stage = %stage.kind,
                        exit_code = ?outcome.exit_code,
                        "Initializer failed, continuing startup"
                    );
                    Ok(Some(outcome))
                }
                FailurePolicy::Abort => Err(LaunchError::StageFailed {
                    stage: stage.kind,
                    code: outcome.exit_code,
                }),
            },
            Err(err) => match policy {
                FailurePolicy::Continue => {
                    warn!(stage = %stage.kind, error = %err, "Initializer could not start, continuing startup");
                    Ok(None)
                }
                FailurePolicy::Abort => Err(err),
            },
        }
    }

    /// Start the worker in the background; a spawn failure is logged, never fatal
    pub fn start_worker(&mut self) -> Result<Option<u32>> {
        let Some(stage) = self.plan.worker.clone() else {
            debug!("No worker configured");
            return Ok(None);
        };

        self.announce(&stage)?;
        let command = self.command_for(&stage);

        match self.launcher.spawn_detached(&command) {
            Ok(pid) => {
                info!(stage = %stage.kind, pid, "Worker started");
                Ok(Some(pid))
            }
            Err(err) => {
                warn!(stage = %stage.kind, error = %err, "Worker could not start");
                Ok(None)
            }
        }
    }

    /// Hand the process over to the server; returns only if that fails
    pub fn exec_server(&mut self) -> Result<Infallible> {
        let stage = self.plan.server.clone();
        self.announce(&stage)?;
        let command = self.command_for(&stage);

        info!(
            stage = %stage.kind,
            host = %self.plan.bind.host,
            port = self.plan.bind.port,
            command = %command.command_line,
            "Replacing launcher with server"
        );
        self.launcher.replace_process(&command)
    }

    /// The full sequence
    #[instrument(name = "launch", skip_all, fields(app = %self.plan.name))]
    pub async fn launch(&mut self) -> Result<Infallible> {
        self.prepare_directories()?;
        self.run_initializer().await?;
        self.start_worker()?;
        self.exec_server()
    }
}
