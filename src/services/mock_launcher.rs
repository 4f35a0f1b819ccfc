use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Mutex;

use chrono::Utc;

use crate::models::launch_plan::StageKind;
use crate::services::process_launcher::{LaunchCommand, ProcessLauncher, StageOutcome};
use crate::utils::error::{LaunchError, Result};

/// How a recorded call was made
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Completion,
    Detached,
    Replace,
}

/// Launcher that records calls instead of starting processes
#[derive(Debug, Default)]
pub struct RecordingLauncher {
    calls: Mutex<Vec<(CallKind, LaunchCommand)>>,
    exit_codes: HashMap<StageKind, i32>,
    spawn_failures: Vec<StageKind>,
}

impl RecordingLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `run_to_completion` report `code` for `stage`
    pub fn with_exit_code(mut self, stage: StageKind, code: i32) -> Self {
        self.exit_codes.insert(stage, code);
        self
    }

    /// Make any launch of `stage` fail to spawn
    pub fn with_spawn_failure(mut self, stage: StageKind) -> Self {
        self.spawn_failures.push(stage);
        self
    }

    pub fn calls(&self) -> Vec<(CallKind, LaunchCommand)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn stages_called(&self) -> Vec<(CallKind, StageKind)> {
        self.calls()
            .into_iter()
            .map(|(kind, cmd)| (kind, cmd.stage))
            .collect()
    }

    fn record(&self, kind: CallKind, command: &LaunchCommand) -> Result<()> {
        self.calls.lock().unwrap().push((kind, command.clone()));
        if self.spawn_failures.contains(&command.stage) {
            return Err(LaunchError::Spawn {
                stage: command.stage,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "scripted failure"),
            });
        }
        Ok(())
    }
}

impl ProcessLauncher for RecordingLauncher {
    async fn run_to_completion(&self, command: &LaunchCommand) -> Result<StageOutcome> {
        self.record(CallKind::Completion, command)?;
        Ok(StageOutcome {
            stage: command.stage,
            exit_code: Some(self.exit_codes.get(&command.stage).copied().unwrap_or(0)),
            started_at: Utc::now(),
            duration_ms: 0,
        })
    }

    fn spawn_detached(&self, command: &LaunchCommand) -> Result<u32> {
        self.record(CallKind::Detached, command)?;
        Ok(4242)
    }

    fn replace_process(&self, command: &LaunchCommand) -> Result<Infallible> {
        self.record(CallKind::Replace, command)?;
        Err(LaunchError::Exec {
            source: std::io::Error::new(std::io::ErrorKind::Other, "recorded exec"),
        })
    }
}
