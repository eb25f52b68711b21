//! Test Machine CLI
//!
//! Manages stored Git credentials and registered repositories, and syncs
//! their branches and tags from the command line.

mod cli;
mod commands;
mod error;
mod logging;
mod secret;

use std::path::Path;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    tracing::debug!("Verbose mode enabled");

    match cli.command {
        Some(cmd) => execute_command(cmd, cli.config.as_deref()),
        None => {
            // No command provided - show help hint
            println!("{} Test Machine CLI", "tm".green().bold());
            println!();
            println!("Run {} for available commands.", "tm --help".cyan());
            Ok(())
        }
    }
}

fn execute_command(cmd: Commands, config: Option<&Path>) -> Result<()> {
    match cmd {
        Commands::Credential { action } => commands::run_credential(config, action),
        Commands::Repo { action } => commands::run_repo(config, action),
        Commands::Sync { id, json } => commands::run_sync(config, id, json),
    }
}
