//! Sync command implementation

use std::path::Path;

use colored::Colorize;

use super::{open_engine, print_json};
use crate::commands::repo::print_details;
use crate::error::{CliError, Result};

/// Run the sync command
///
/// Prints the result either way; an unsuccessful sync becomes
/// [`CliError::SyncFailed`] so the process exits non-zero.
pub fn run_sync(config: Option<&Path>, id: i64, json: bool) -> Result<()> {
    let engine = open_engine(config)?;

    if !json {
        println!("{} Syncing repository {}...", "=>".blue().bold(), id.to_string().cyan());
    }
    let result = engine.trigger_sync(id)?;

    if json {
        print_json(&result)?;
    } else if result.success {
        println!(
            "{} {} ({} branches, {} tags)",
            "OK".green().bold(),
            result.message,
            result.branch_count,
            result.tag_count
        );
        if let Some(repository) = &result.repository {
            println!();
            print_details(repository);
        }
    }

    if result.success {
        Ok(())
    } else {
        Err(CliError::SyncFailed {
            message: result.message,
        })
    }
}
