//! Repository synchronization
//!
//! A sync resolves the repository's credential, lists the remote's refs,
//! classifies them, and swaps the stored snapshot in one transaction.
//! Everything that can go wrong on the far side of the network is an
//! expected outcome and is reported in [`SyncResult`], not as an error.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tm_git::{AuthNegotiator, RefLister};
use tm_store::{Repository, RepositoryStore};

use crate::lock::RepositoryLocks;
use crate::refs::classify_refs;
use crate::{Error, Result};

pub const SYNC_SUCCEEDED: &str = "Repository synced successfully";

/// Outcome of one sync attempt. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    /// Whether the snapshot was replaced
    pub success: bool,
    /// Human-readable outcome
    pub message: String,
    pub branch_count: usize,
    pub tag_count: usize,
    /// Refreshed repository with branches and tags, on success
    pub repository: Option<Repository>,
}

impl SyncResult {
    /// Create a successful result from the refreshed repository
    pub fn success(repository: Repository) -> Self {
        Self {
            success: true,
            message: SYNC_SUCCEEDED.to_string(),
            branch_count: repository.branches.len(),
            tag_count: repository.tags.len(),
            repository: Some(repository),
        }
    }

    /// Create a failed result
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            branch_count: 0,
            tag_count: 0,
            repository: None,
        }
    }
}

/// Orchestrates repository syncs.
///
/// Syncs of the same repository are serialized in-process; the store's
/// transaction keeps concurrent writers from other processes consistent.
pub struct RepositorySynchronizer {
    repositories: Arc<dyn RepositoryStore>,
    negotiator: AuthNegotiator,
    lister: Arc<dyn RefLister>,
    locks: RepositoryLocks,
}

impl RepositorySynchronizer {
    pub fn new(
        repositories: Arc<dyn RepositoryStore>,
        negotiator: AuthNegotiator,
        lister: Arc<dyn RefLister>,
    ) -> Self {
        Self {
            repositories,
            negotiator,
            lister,
            locks: RepositoryLocks::new(),
        }
    }

    /// Sync one repository against its remote.
    ///
    /// # Errors
    ///
    /// Only [`Error::RepositoryNotFound`], a missing credential, or a failure
    /// to read the repository row. Auth, remote and write failures come
    /// back as `Ok` with `success == false`.
    pub fn sync(&self, repository_id: i64) -> Result<SyncResult> {
        self.locks
            .with_lock(repository_id, || self.sync_locked(repository_id))
    }

    fn sync_locked(&self, id: i64) -> Result<SyncResult> {
        let repository = self
            .repositories
            .get_repository(id)?
            .ok_or(Error::RepositoryNotFound { id })?;
        tracing::info!(repository_id = id, url = %repository.remote_url, "Starting repository sync");

        let auth = match self.negotiator.resolve(repository.credential_id) {
            Ok(auth) => auth,
            Err(tm_git::Error::Vault(err @ tm_vault::Error::NotFound { .. })) => {
                return Err(err.into());
            }
            Err(e) => {
                tracing::warn!(repository_id = id, error = %e, "Credential resolution failed");
                return Ok(SyncResult::failure(format!("Authentication failed: {e}")));
            }
        };

        let refs = match self.lister.list(&repository.remote_url, auth.as_ref()) {
            Ok(refs) => refs,
            Err(e) => {
                tracing::warn!(repository_id = id, url = %repository.remote_url, error = %e, "Remote ref listing failed");
                return Ok(SyncResult::failure(format!("Failed to access Git repository: {e}")));
            }
        };

        let replacement = classify_refs(&refs).into_replacement(Utc::now());
        match self.repositories.replace_branches_and_tags(id, &replacement) {
            Ok(refreshed) => {
                let result = SyncResult::success(refreshed);
                tracing::info!(
                    repository_id = id,
                    branch_count = result.branch_count,
                    tag_count = result.tag_count,
                    "Repository synced"
                );
                Ok(result)
            }
            Err(tm_store::Error::NotFound { .. }) => Err(Error::RepositoryNotFound { id }),
            Err(e) => {
                tracing::warn!(repository_id = id, error = %e, "Snapshot replace rolled back");
                Ok(SyncResult::failure(format!("Failed to store repository data: {e}")))
            }
        }
    }
}
