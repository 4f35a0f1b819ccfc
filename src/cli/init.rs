use serde_json::json;

use crate::cli::{current_dir, display_path, print_json, ConfigLocation};
use crate::models::launch_plan::LaunchPlan;
use crate::utils::config::ConfigParser;
use crate::utils::error::{LaunchError, Result};

/// Write a launch file with the default plan
#[derive(Debug)]
pub struct InitCommand {
    pub location: ConfigLocation,
    pub name: Option<String>,
    pub force: bool,
    pub json: bool,
}

impl InitCommand {
    pub fn run(&self) -> Result<()> {
        let path = &self.location.path;

        if path.exists() && !self.force {
            return Err(LaunchError::Validation(format!(
                "{} already exists. Use --force to overwrite it.",
                path.display()
            )));
        }

        let plan = LaunchPlan {
            name: self.resolve_name()?,
            ..LaunchPlan::default()
        };
        ConfigParser::save_launch_config(&plan, path)?;

        if self.json {
            return print_json(&json!({
                "status": "success",
                "path": display_path(path),
                "name": plan.name,
            }));
        }

        println!("Created {} for '{}'", path.display(), plan.name);
        Ok(())
    }

    /// Explicit name, else the current directory's name if it is usable, else "app"
    fn resolve_name(&self) -> Result<String> {
        if let Some(name) = &self.name {
            return Ok(name.clone());
        }

        let dir = current_dir()?;
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .filter(|n| {
                !n.is_empty() && n.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_')
            })
            .unwrap_or_else(|| LaunchPlan::default().name);
        Ok(name)
    }
}
