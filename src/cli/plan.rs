use serde::Serialize;

use crate::cli::{current_dir, display_path, print_json, ConfigLocation};
use crate::models::launch_plan::{FailurePolicy, LaunchPlan, ServerBind, StageKind};
use crate::utils::error::Result;

/// Show the resolved plan
#[derive(Debug)]
pub struct PlanCommand {
    pub location: ConfigLocation,
    pub json: bool,
}

#[derive(Debug, Serialize)]
pub struct PlannedStage {
    pub kind: StageKind,
    pub banner: String,
    pub command: String,
}

/// Resolved view of a plan: paths made absolute, commands rendered
#[derive(Debug, Serialize)]
pub struct PlanReport {
    pub name: String,
    pub workdir: String,
    pub directories: Vec<String>,
    pub on_init_failure: FailurePolicy,
    pub bind: ServerBind,
    pub stages: Vec<PlannedStage>,
}

impl PlanReport {
    pub fn build(plan: &LaunchPlan, base_dir: &std::path::Path) -> Self {
        let workdir = plan.resolved_workdir(base_dir);
        Self {
            name: plan.name.clone(),
            workdir: display_path(&workdir),
            directories: plan
                .resolved_directories(&workdir)
                .iter()
                .map(|d| display_path(d))
                .collect(),
            on_init_failure: plan.on_init_failure,
            bind: plan.bind.clone(),
            stages: plan
                .stages()
                .into_iter()
                .map(|stage| PlannedStage {
                    kind: stage.kind,
                    banner: stage.banner.clone(),
                    command: stage.render(&plan.bind),
                })
                .collect(),
        }
    }
}

impl PlanCommand {
    pub fn run(&self) -> Result<()> {
        let plan = self.location.load()?;
        let report = PlanReport::build(&plan, &current_dir()?);

        if self.json {
            return print_json(&report);
        }

        println!("Launch plan '{}'", report.name);
        println!("  workdir:     {}", report.workdir);
        println!("  directories: {}", report.directories.join(", "));
        println!("  on failure:  {:?}", report.on_init_failure);
        println!("  listen:      {}:{}", report.bind.host, report.bind.port);
        println!();
        for (i, stage) in report.stages.iter().enumerate() {
            println!("  {}. {:<12} {}", i + 1, stage.kind.as_str(), stage.command);
        }

        Ok(())
    }
}
