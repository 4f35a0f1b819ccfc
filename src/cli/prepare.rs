use serde_json::json;

use crate::cli::{current_dir, display_path, print_json, ConfigLocation};
use crate::services::process_launcher::SystemLauncher;
use crate::services::sequencer::Sequencer;
use crate::utils::error::Result;

/// Create the application directories without launching anything
#[derive(Debug)]
pub struct PrepareCommand {
    pub location: ConfigLocation,
    pub json: bool,
}

impl PrepareCommand {
    pub fn run(&self) -> Result<()> {
        let plan = self.location.load()?;
        let sequencer = Sequencer::new(plan, SystemLauncher::new(), &current_dir()?);
        let created = sequencer.prepare_directories()?;

        if self.json {
            let created: Vec<_> = created.iter().map(|p| display_path(p)).collect();
            return print_json(&json!({
                "workdir": display_path(sequencer.workdir()),
                "created": created,
            }));
        }

        if created.is_empty() {
            println!("All directories already present");
        } else {
            for dir in &created {
                println!("Created {}", dir.display());
            }
        }

        Ok(())
    }
}
