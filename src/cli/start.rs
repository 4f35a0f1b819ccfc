use tracing::info;

use crate::cli::{current_dir, ConfigLocation};
use crate::models::launch_plan::{FailurePolicy, LaunchPlan};
use crate::services::process_launcher::SystemLauncher;
use crate::services::sequencer::Sequencer;
use crate::utils::error::{LaunchError, Result};

/// Run the launch sequence
#[derive(Debug)]
pub struct StartCommand {
    pub location: ConfigLocation,
    pub port: Option<u16>,
    pub host: Option<String>,
    pub strict: bool,
    pub skip_init: bool,
    pub skip_worker: bool,
}

impl StartCommand {
    /// Apply command-line overrides on top of the launch file
    pub fn apply_overrides(&self, mut plan: LaunchPlan) -> Result<LaunchPlan> {
        if let Some(port) = self.port {
            plan.bind.port = port;
        }
        if let Some(host) = &self.host {
            plan.bind.host.clone_from(host);
        }
        if self.strict {
            plan.on_init_failure = FailurePolicy::Abort;
        }
        if self.skip_init {
            plan.initializer = None;
        }
        if self.skip_worker {
            plan.worker = None;
        }

        plan.validate().map_err(LaunchError::Validation)?;
        Ok(plan)
    }

    pub async fn run(&self) -> Result<()> {
        let plan = self.apply_overrides(self.location.load()?)?;
        let base_dir = current_dir()?;

        info!(
            app = %plan.name,
            config = %self.location.path.display(),
            "Starting launch sequence"
        );

        let mut sequencer = Sequencer::new(plan, SystemLauncher::new(), &base_dir);
        match sequencer.launch().await {
            Ok(never) => match never {},
            Err(err) => Err(err),
        }
    }
}
