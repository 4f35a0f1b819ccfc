// Common error types for launchseq

use thiserror::Error;

use crate::models::launch_plan::StageKind;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Stage '{stage}' failed with exit code {}", display_code(.code))]
    StageFailed { stage: StageKind, code: Option<i32> },

    #[error("Failed to start stage '{stage}': {source}")]
    Spawn {
        stage: StageKind,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to exec server process: {source}")]
    Exec {
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, LaunchError>;

fn display_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "unknown".to_string(), |c| c.to_string())
}

/// Error as presented to the person at the terminal
#[derive(Debug)]
pub struct UserError {
    pub message: String,
    pub exit_code: i32,
}

impl UserError {
    pub fn from_launch_error(err: &LaunchError) -> Self {
        let exit_code = match err {
            LaunchError::Io(_) => 1,
            LaunchError::Config(_) | LaunchError::Validation(_) => 2,
            LaunchError::StageFailed { code, .. } => match code {
                Some(c) if *c != 0 => *c,
                _ => 1,
            },
            LaunchError::Spawn { .. } | LaunchError::Exec { .. } => 127,
        };

        Self {
            message: err.to_string(),
            exit_code,
        }
    }

    pub fn print(&self) {
        eprintln!("Error: {}", self.message);
    }
}
