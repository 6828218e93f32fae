//! Sahayak CLI
//!
//! Runs the lesson planner and quiz generator flows from the terminal.

mod cli;
mod logging;

use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();
    logging::init(cli.verbose);

    if let Err(err) = cli::run(cli).await {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
