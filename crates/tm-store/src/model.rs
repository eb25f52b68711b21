//! Plain entity rows for repositories and their ref snapshots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A Git repository registered for syncing.
///
/// `remote_url` is fixed at creation; the store refuses to change it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub remote_url: String,
    pub credential_id: Option<i64>,
    pub default_branch: Option<String>,
    pub synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Populated only by reads that ask for refs
    #[serde(default)]
    pub branches: Vec<Branch>,
    /// Populated only by reads that ask for refs
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// A branch in a repository's last synced snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: i64,
    pub repository_id: i64,
    pub name: String,
    pub commit_hash: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// A tag in a repository's last synced snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub repository_id: i64,
    pub name: String,
    pub commit_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Branch row to be written by a snapshot replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRecord {
    pub name: String,
    pub commit_hash: Option<String>,
    pub is_default: bool,
}

/// Tag row to be written by a snapshot replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    pub name: String,
    pub commit_hash: Option<String>,
}

/// A complete new ref snapshot for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefReplacement {
    pub branches: Vec<BranchRecord>,
    pub tags: Vec<TagRecord>,
    pub default_branch: Option<String>,
    pub synced_at: DateTime<Utc>,
}

/// Request to register a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRepository {
    pub name: String,
    pub description: Option<String>,
    pub remote_url: String,
    pub credential_id: Option<i64>,
}

impl NewRepository {
    pub fn new(name: impl Into<String>, remote_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            remote_url: remote_url.into(),
            credential_id: None,
        }
    }

    pub fn with_credential(mut self, credential_id: i64) -> Self {
        self.credential_id = Some(credential_id);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Mutable fields of a repository. `remote_url` is not among them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryUpdate {
    pub name: String,
    pub description: Option<String>,
    pub credential_id: Option<i64>,
}
