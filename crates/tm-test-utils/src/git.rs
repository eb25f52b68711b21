//! Local Git remotes for ref-listing tests.
//!
//! Every fixture is a real repository on disk, created with `git2`, that a
//! detached remote can connect to through the local transport. No network or
//! `git` binary is needed.

use std::path::Path;

use git2::{Oid, Repository, Signature};
use tempfile::TempDir;

/// A temporary repository acting as a Git remote.
///
/// All branches and tags created through the builder point at the same
/// initial commit unless moved with [`RemoteFixture::commit_on`].
pub struct RemoteFixture {
    dir: TempDir,
    repo: Repository,
    initial: Oid,
}

impl RemoteFixture {
    /// Initialise a repository with one empty commit on `first_branch`.
    ///
    /// # Panics
    /// Panics if any git operation fails.
    pub fn new(first_branch: &str) -> Self {
        let dir = TempDir::new().unwrap_or_else(|e| panic!("RemoteFixture: tempdir: {e}"));
        let repo = Repository::init(dir.path()).unwrap_or_else(|e| {
            panic!(
                "RemoteFixture: failed to init repository at {}: {e}",
                dir.path().display()
            )
        });

        let initial = {
            let sig = signature();
            let tree_id = repo
                .index()
                .and_then(|mut index| index.write_tree())
                .unwrap_or_else(|e| panic!("RemoteFixture: failed to write tree: {e}"));
            let tree = repo
                .find_tree(tree_id)
                .unwrap_or_else(|e| panic!("RemoteFixture: missing tree: {e}"));
            repo.commit(None, &sig, &sig, "Initial commit", &tree, &[])
                .unwrap_or_else(|e| panic!("RemoteFixture: failed to commit: {e}"))
        };

        let fixture = Self { dir, repo, initial };
        fixture.branch(first_branch);
        fixture
            .repo
            .set_head(&format!("refs/heads/{first_branch}"))
            .unwrap_or_else(|e| panic!("RemoteFixture: failed to set HEAD: {e}"));
        fixture
    }

    /// Location usable as a remote URL.
    pub fn url(&self) -> String {
        self.dir.path().to_string_lossy().into_owned()
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Hex id of the initial commit.
    pub fn initial_commit(&self) -> String {
        self.initial.to_string()
    }

    /// Create (or reset) a branch at the initial commit.
    pub fn branch(&self, name: &str) -> &Self {
        let commit = self
            .repo
            .find_commit(self.initial)
            .unwrap_or_else(|e| panic!("RemoteFixture: missing initial commit: {e}"));
        self.repo
            .branch(name, &commit, true)
            .unwrap_or_else(|e| panic!("RemoteFixture: failed to create branch {name}: {e}"));
        self
    }

    /// Create a lightweight tag at the initial commit.
    pub fn lightweight_tag(&self, name: &str) -> &Self {
        let object = self
            .repo
            .find_object(self.initial, None)
            .unwrap_or_else(|e| panic!("RemoteFixture: missing initial commit: {e}"));
        self.repo
            .tag_lightweight(name, &object, true)
            .unwrap_or_else(|e| panic!("RemoteFixture: failed to create tag {name}: {e}"));
        self
    }

    /// Create an annotated tag at the initial commit and return the tag object id.
    pub fn annotated_tag(&self, name: &str) -> String {
        let object = self
            .repo
            .find_object(self.initial, None)
            .unwrap_or_else(|e| panic!("RemoteFixture: missing initial commit: {e}"));
        self.repo
            .tag(name, &object, &signature(), &format!("Release {name}"), true)
            .unwrap_or_else(|e| panic!("RemoteFixture: failed to create tag {name}: {e}"))
            .to_string()
    }

    /// Add an empty commit on top of `branch` and return its id.
    pub fn commit_on(&self, branch: &str, message: &str) -> String {
        let refname = format!("refs/heads/{branch}");
        let parent = self
            .repo
            .find_reference(&refname)
            .and_then(|r| r.peel_to_commit())
            .unwrap_or_else(|e| panic!("RemoteFixture: missing branch {branch}: {e}"));
        let tree = parent
            .tree()
            .unwrap_or_else(|e| panic!("RemoteFixture: missing tree: {e}"));
        let sig = signature();
        self.repo
            .commit(Some(&refname), &sig, &sig, message, &tree, &[&parent])
            .unwrap_or_else(|e| panic!("RemoteFixture: failed to commit on {branch}: {e}"))
            .to_string()
    }

    /// Delete a branch.
    pub fn delete_branch(&self, name: &str) {
        let mut branch = self
            .repo
            .find_branch(name, git2::BranchType::Local)
            .unwrap_or_else(|e| panic!("RemoteFixture: missing branch {name}: {e}"));
        branch
            .delete()
            .unwrap_or_else(|e| panic!("RemoteFixture: failed to delete {name}: {e}"));
    }
}

/// A path that is guaranteed not to hold a repository.
pub fn missing_remote_url() -> String {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("missing_remote_url: tempdir: {e}"));
    dir.path()
        .join("does-not-exist.git")
        .to_string_lossy()
        .into_owned()
}

fn signature() -> Signature<'static> {
    Signature::now("Test User", "test@example.com")
        .unwrap_or_else(|e| panic!("RemoteFixture: failed to build signature: {e}"))
}
