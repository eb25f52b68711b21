//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tm_vault::CredentialKind;

/// Test Machine - Manage Git credentials and sync repository branches and tags
#[derive(Parser, Debug)]
#[command(name = "tm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (TOML)
    #[arg(long, global = true, env = "TM_CONFIG")]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Manage stored Git credentials
    Credential {
        #[command(subcommand)]
        action: CredentialAction,
    },

    /// Manage registered repositories
    Repo {
        #[command(subcommand)]
        action: RepoAction,
    },

    /// Sync a repository's branches and tags from its remote
    ///
    /// Exits non-zero if the sync did not succeed.
    ///
    /// Examples:
    ///   tm sync 3           # Sync repository 3
    ///   tm sync 3 --json    # Print the sync result as JSON
    Sync {
        /// Repository id
        id: i64,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}

/// Credential kinds accepted on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    /// SSH private key (unencrypted PEM or OpenSSH format)
    SshKey,
    /// Username with password or access token
    BasicAuth,
}

impl From<KindArg> for CredentialKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::SshKey => CredentialKind::SshKey,
            KindArg::BasicAuth => CredentialKind::BasicAuth,
        }
    }
}

/// Where to read a secret from. Without either flag the secret is prompted for.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretArgs {
    /// Read the secret from a file
    #[arg(long, value_name = "PATH", conflicts_with = "secret_stdin")]
    pub secret_file: Option<PathBuf>,

    /// Read the secret from standard input
    #[arg(long)]
    pub secret_stdin: bool,
}

impl SecretArgs {
    pub fn is_given(&self) -> bool {
        self.secret_file.is_some() || self.secret_stdin
    }
}

/// Credential subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CredentialAction {
    /// Store a new credential
    ///
    /// Examples:
    ///   tm credential add deploy --kind ssh-key --secret-file ~/.ssh/deploy_key
    ///   tm credential add ci --kind basic-auth --username bot
    Add {
        /// Display name
        name: String,

        /// Credential kind
        #[arg(short, long, value_enum)]
        kind: KindArg,

        /// Username (basic auth only)
        #[arg(short, long)]
        username: Option<String>,

        /// Free-form description
        #[arg(short, long)]
        description: Option<String>,

        #[command(flatten)]
        secret: SecretArgs,
    },

    /// List stored credentials
    List {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show one credential (never its secret)
    Show {
        /// Credential id
        id: i64,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Change a credential's fields or rotate its secret
    Update {
        /// Credential id
        id: i64,

        /// New display name
        #[arg(long)]
        name: Option<String>,

        /// New username (basic auth only)
        #[arg(short, long)]
        username: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// Replace the stored secret
        #[arg(long)]
        rotate_secret: bool,

        #[command(flatten)]
        secret: SecretArgs,
    },

    /// Delete a credential no repository uses
    Remove {
        /// Credential id
        id: i64,
    },
}

/// Repository subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum RepoAction {
    /// Register a repository
    ///
    /// Examples:
    ///   tm repo add api https://git.example.com/team/api.git
    ///   tm repo add infra git@git.example.com:team/infra.git --credential 2
    Add {
        /// Display name
        name: String,

        /// Remote URL; cannot be changed later
        url: String,

        /// Credential id used to authenticate
        #[arg(short, long)]
        credential: Option<i64>,

        /// Free-form description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// List registered repositories
    List {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show a repository with its last synced branches and tags
    Show {
        /// Repository id
        id: i64,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Delete a repository and its synced branches and tags
    Remove {
        /// Repository id
        id: i64,
    },
}
