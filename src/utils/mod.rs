// Shared utilities: errors, launch file parsing, logging
pub mod config;
pub mod error;
pub mod logging;
