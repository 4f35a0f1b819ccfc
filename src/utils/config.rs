// Launch file loading and TOML parsing

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::models::launch_plan::{LaunchPlan, LaunchToml};
use crate::utils::error::{LaunchError, Result};

/// File looked up in the current directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "launch.toml";

/// Launch file parsing and validation utilities
pub struct ConfigParser;

impl ConfigParser {
    /// Load the plan for `path`.
    ///
    /// A missing file is only tolerated when `explicit` is false; the built-in
    /// plan is used then.
    pub fn load_or_default<P: AsRef<Path>>(path: P, explicit: bool) -> Result<LaunchPlan> {
        let path = path.as_ref();
        if !explicit && !path.exists() {
            debug!(path = %path.display(), "No launch file, using built-in plan");
            return Ok(LaunchPlan::default());
        }
        Self::load_launch_config(path)
    }

    /// Load and validate a plan from a launch file
    pub fn load_launch_config<P: AsRef<Path>>(path: P) -> Result<LaunchPlan> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(LaunchError::Config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            LaunchError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        debug!(path = %path.display(), "Loaded launch file");
        Self::parse_launch_config(&content)
    }

    /// Parse and validate a plan from TOML text
    pub fn parse_launch_config(content: &str) -> Result<LaunchPlan> {
        let launch_toml: LaunchToml = toml::from_str(content)
            .map_err(|e| LaunchError::Config(format!("Invalid TOML syntax: {e}")))?;

        let plan = LaunchPlan::from(launch_toml);
        plan.validate().map_err(LaunchError::Validation)?;
        Ok(plan)
    }

    /// Write a plan to a launch file
    pub fn save_launch_config<P: AsRef<Path>>(plan: &LaunchPlan, path: P) -> Result<()> {
        let path = path.as_ref();

        plan.validate().map_err(LaunchError::Validation)?;

        let content = toml::to_string_pretty(&LaunchToml::from(plan.clone())).map_err(|e| {
            LaunchError::Config(format!("Failed to serialize configuration: {e}"))
        })?;

        fs::write(path, content).map_err(|e| {
            LaunchError::Config(format!("Failed to write {}: {}", path.display(), e))
        })?;

        Ok(())
    }
}

pub fn get_default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}
