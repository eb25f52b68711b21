//! Storage seam used by the repository synchronizer

use crate::Result;
use crate::model::{RefReplacement, Repository};

/// Read and snapshot-replace access to repositories.
pub trait RepositoryStore: Send + Sync {
    /// Fetch a repository row without its branches and tags.
    fn get_repository(&self, id: i64) -> Result<Option<Repository>>;

    /// Fetch a repository with its current branch and tag snapshot.
    fn get_repository_with_refs(&self, id: i64) -> Result<Option<Repository>>;

    /// Atomically swap a repository's ref snapshot.
    ///
    /// Deletes every branch and tag row of the repository, inserts the rows in
    /// `replacement`, and sets `default_branch` and `synced_at`, all in one
    /// transaction. On any error nothing is applied and the previous snapshot
    /// stays visible. Returns the refreshed repository with its refs.
    fn replace_branches_and_tags(&self, id: i64, replacement: &RefReplacement)
    -> Result<Repository>;
}
