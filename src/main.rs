// launchseq - container entrypoint
// Main CLI entry point

use clap::Parser;
use launchseq::cli::{Cli, CliDispatcher};
use launchseq::utils::error::UserError;
use launchseq::utils::logging::setup_tracing;
use std::process;

#[tokio::main]
async fn main() {
    setup_tracing();
    let cli = Cli::parse();

    let result = CliDispatcher::execute(cli).await;

    if let Err(err) = result {
        let user_error = UserError::from_launch_error(&err);
        user_error.print();
        process::exit(user_error.exit_code);
    }
}
