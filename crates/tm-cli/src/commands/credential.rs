//! Credential subcommands

use std::path::Path;

use colored::Colorize;
use tm_vault::{Credential, CredentialKind, CredentialUpdate, NewCredential};

use super::{open_engine, print_json};
use crate::cli::CredentialAction;
use crate::error::{CliError, Result};
use crate::secret::read_secret;

pub fn run_credential(config: Option<&Path>, action: CredentialAction) -> Result<()> {
    let engine = open_engine(config)?;
    let vault = engine.vault();

    match action {
        CredentialAction::Add {
            name,
            kind,
            username,
            description,
            secret,
        } => {
            let kind = CredentialKind::from(kind);
            let secret = read_secret(&secret, kind)?;
            let mut request = NewCredential::new(name, kind, secret.as_str());
            if let Some(username) = username {
                request = request.with_username(username);
            }
            if let Some(description) = description {
                request = request.with_description(description);
            }

            let credential = vault.create(&request)?;
            println!(
                "{} Stored credential {} ({})",
                "OK".green().bold(),
                credential.id.to_string().cyan(),
                credential.name
            );
        }
        CredentialAction::List { json } => {
            let credentials = vault.list()?;
            if json {
                return print_json(&credentials);
            }
            if credentials.is_empty() {
                println!("No credentials stored.");
                return Ok(());
            }
            for credential in &credentials {
                print_summary(credential);
            }
        }
        CredentialAction::Show { id, json } => {
            let credential = vault.get(id)?;
            if json {
                return print_json(&credential);
            }
            print_summary(&credential);
            if let Some(description) = &credential.description {
                println!("    {description}");
            }
            println!(
                "    created {}, updated {}",
                credential.created_at.to_rfc3339(),
                credential.updated_at.to_rfc3339()
            );
        }
        CredentialAction::Update {
            id,
            name,
            username,
            description,
            rotate_secret,
            secret,
        } => {
            if secret.is_given() && !rotate_secret {
                return Err(CliError::user(
                    "--secret-file and --secret-stdin require --rotate-secret",
                ));
            }
            let existing = vault.get(id)?;

            let mut request = CredentialUpdate::new(name.unwrap_or(existing.name));
            if let Some(username) = username.or(existing.username) {
                request = request.with_username(username);
            }
            if let Some(description) = description.or(existing.description) {
                request = request.with_description(description);
            }
            if rotate_secret {
                let secret = read_secret(&secret, existing.kind)?;
                request = request.with_secret(secret.as_str());
            }

            let credential = vault.update(id, &request)?;
            println!(
                "{} Updated credential {}{}",
                "OK".green().bold(),
                credential.id.to_string().cyan(),
                if rotate_secret { " (secret rotated)" } else { "" }
            );
        }
        CredentialAction::Remove { id } => {
            engine.delete_credential(id)?;
            println!("{} Removed credential {}", "OK".green().bold(), id.to_string().cyan());
        }
    }

    Ok(())
}

fn print_summary(credential: &Credential) {
    let user = credential
        .username
        .as_deref()
        .map(|u| format!(" as {u}"))
        .unwrap_or_default();
    println!(
        "{:>4}  {}  {}{}",
        credential.id.to_string().cyan(),
        credential.name.bold(),
        credential.kind.to_string().dimmed(),
        user
    );
}
