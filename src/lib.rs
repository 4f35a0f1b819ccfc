// launchseq - container entrypoint
// Core library functionality

pub mod cli;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use models::launch_plan::{FailurePolicy, LaunchPlan, ServerBind, Stage, StageKind};
pub use services::process_launcher::{LaunchCommand, ProcessLauncher, StageOutcome, SystemLauncher};
pub use services::sequencer::Sequencer;
pub use utils::error::{LaunchError, Result};
