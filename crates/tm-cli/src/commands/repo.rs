//! Repository subcommands

use std::path::Path;

use colored::Colorize;
use tm_store::{NewRepository, Repository, RepositoryStore};

use super::{open_engine, print_json};
use crate::cli::RepoAction;
use crate::error::{CliError, Result};

pub fn run_repo(config: Option<&Path>, action: RepoAction) -> Result<()> {
    let engine = open_engine(config)?;
    let store = engine.store();

    match action {
        RepoAction::Add {
            name,
            url,
            credential,
            description,
        } => {
            let mut request = NewRepository::new(name, url);
            if let Some(credential_id) = credential {
                // Fails with NotFound before the foreign key would.
                engine.vault().get(credential_id)?;
                request = request.with_credential(credential_id);
            }
            if let Some(description) = description {
                request = request.with_description(description);
            }

            let repository = store.create_repository(&request)?;
            println!(
                "{} Registered repository {} ({})",
                "OK".green().bold(),
                repository.id.to_string().cyan(),
                repository.remote_url
            );
            println!(
                "Run {} to fetch its branches and tags.",
                format!("tm sync {}", repository.id).cyan()
            );
        }
        RepoAction::List { json } => {
            let repositories = store.list_repositories()?;
            if json {
                return print_json(&repositories);
            }
            if repositories.is_empty() {
                println!("No repositories registered.");
                return Ok(());
            }
            for repository in &repositories {
                print_summary(repository);
            }
        }
        RepoAction::Show { id, json } => {
            let repository = store
                .get_repository_with_refs(id)?
                .ok_or_else(|| CliError::Core(tm_core::Error::RepositoryNotFound { id }))?;
            if json {
                return print_json(&repository);
            }
            print_details(&repository);
        }
        RepoAction::Remove { id } => {
            store.delete_repository(id)?;
            println!("{} Removed repository {}", "OK".green().bold(), id.to_string().cyan());
        }
    }

    Ok(())
}

fn print_summary(repository: &Repository) {
    let synced = repository
        .synced_at
        .map(|at| format!("synced {}", at.to_rfc3339()))
        .unwrap_or_else(|| "never synced".to_string());
    println!(
        "{:>4}  {}  {}  {}",
        repository.id.to_string().cyan(),
        repository.name.bold(),
        repository.remote_url,
        synced.dimmed()
    );
}

/// Summary line followed by the stored branch and tag snapshot.
pub fn print_details(repository: &Repository) {
    print_summary(repository);
    if let Some(description) = &repository.description {
        println!("    {description}");
    }
    if let Some(credential_id) = repository.credential_id {
        println!("    credential {credential_id}");
    }

    println!();
    println!("{} ({})", "Branches".bold(), repository.branches.len());
    for branch in &repository.branches {
        let marker = if branch.is_default { "*".green().bold() } else { " ".normal() };
        println!(
            "  {} {:<30} {}",
            marker,
            branch.name,
            short_hash(branch.commit_hash.as_deref()).dimmed()
        );
    }

    println!("{} ({})", "Tags".bold(), repository.tags.len());
    for tag in &repository.tags {
        println!(
            "    {:<30} {}",
            tag.name,
            short_hash(tag.commit_hash.as_deref()).dimmed()
        );
    }
}

fn short_hash(hash: Option<&str>) -> String {
    match hash {
        Some(hash) => hash.chars().take(12).collect(),
        None => "-".to_string(),
    }
}
