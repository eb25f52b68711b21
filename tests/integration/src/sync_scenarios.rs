//! End-to-end sync scenarios
//!
//! Each test opens a real engine on a SQLite file and syncs against Git
//! remotes created on disk with git2.

use std::path::Path;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tm_core::{Config, Engine, SYNC_SUCCEEDED};
use tm_store::{NewRepository, Repository, RepositoryStore, RepositoryUpdate};
use tm_test_utils::git::{RemoteFixture, missing_remote_url};
use tm_vault::{CredentialKind, EnvelopeCipher, NewCredential};

const KEY: &str = "integration-passphrase";

fn open_engine(dir: &Path) -> Engine {
    let db = dir.join("tm.db");
    let config = Config::load_with_env(None, |name| match name {
        "TM_DATABASE_PATH" => Some(db.to_string_lossy().into_owned()),
        "ENCRYPTION_KEY" => Some(KEY.to_string()),
        "TM_REMOTE_TIMEOUT_SECS" => Some("5".to_string()),
        _ => None,
    })
    .unwrap();
    Engine::open(&config).unwrap()
}

fn register(engine: &Engine, url: &str) -> i64 {
    engine
        .store()
        .create_repository(&NewRepository::new("fixture", url))
        .unwrap()
        .id
}

/// Branch and tag rows without ids or timestamps.
fn refs_of(repo: &Repository) -> (Vec<(String, Option<String>, bool)>, Vec<(String, Option<String>)>) {
    (
        repo.branches
            .iter()
            .map(|b| (b.name.clone(), b.commit_hash.clone(), b.is_default))
            .collect(),
        repo.tags
            .iter()
            .map(|t| (t.name.clone(), t.commit_hash.clone()))
            .collect(),
    )
}

// ============================================================================
// Scenario 1: public remote with main and v1.0
// ============================================================================

#[test]
fn public_remote_syncs_branch_tag_and_default() {
    let dir = TempDir::new().unwrap();
    let engine = open_engine(dir.path());
    let remote = RemoteFixture::new("main");
    remote.lightweight_tag("v1.0");
    let id = register(&engine, &remote.url());

    let result = engine.trigger_sync(id).unwrap();

    assert!(result.success, "{}", result.message);
    assert_eq!(result.message, SYNC_SUCCEEDED);
    assert_eq!((result.branch_count, result.tag_count), (1, 1));
    let repo = result.repository.unwrap();
    assert_eq!(repo.default_branch.as_deref(), Some("main"));
    let commit = Some(remote.initial_commit());
    assert_eq!(
        refs_of(&repo),
        (
            vec![("main".to_string(), commit.clone(), true)],
            vec![("v1.0".to_string(), commit)],
        )
    );
}

// ============================================================================
// Scenario 2: basic auth credential without a username
// ============================================================================

#[test]
fn basic_auth_without_username_fails_and_modifies_nothing() {
    let dir = TempDir::new().unwrap();
    let engine = open_engine(dir.path());
    let remote = RemoteFixture::new("main");
    let valid = engine
        .vault()
        .create(&NewCredential::new("ci", CredentialKind::BasicAuth, "token").with_username("bot"))
        .unwrap();
    let repo = engine
        .store()
        .create_repository(&NewRepository::new("fixture", remote.url()).with_credential(valid.id))
        .unwrap();
    assert!(engine.trigger_sync(repo.id).unwrap().success);
    let before = engine.store().get_repository_with_refs(repo.id).unwrap();

    // A row written by an older tool, bypassing validation.
    let sealed = EnvelopeCipher::from_passphrase(KEY)
        .unwrap()
        .encrypt("token")
        .unwrap();
    let broken = engine
        .store()
        .import_credential("legacy", "Login", None, &sealed)
        .unwrap();
    engine
        .store()
        .update_repository(
            repo.id,
            &RepositoryUpdate {
                name: repo.name.clone(),
                description: None,
                credential_id: Some(broken),
            },
        )
        .unwrap();
    let before_refs = before.map(|r| refs_of(&r));

    let result = engine.trigger_sync(repo.id).unwrap();

    assert!(!result.success);
    assert!(result.message.contains("username is required"), "{}", result.message);
    assert_eq!(result.repository, None);
    let after = engine.store().get_repository_with_refs(repo.id).unwrap().unwrap();
    assert_eq!(Some(refs_of(&after)), before_refs);
}

// ============================================================================
// Scenario 3: unreachable remote
// ============================================================================

#[test]
fn unreachable_remote_fails_and_keeps_previous_snapshot() {
    let dir = TempDir::new().unwrap();
    let engine = open_engine(dir.path());
    let remote = RemoteFixture::new("main");
    remote.branch("feature-x").lightweight_tag("v1.0");
    let id = register(&engine, &remote.url());
    assert!(engine.trigger_sync(id).unwrap().success);
    let before = engine.store().get_repository_with_refs(id).unwrap().unwrap();

    drop(remote);
    let result = engine.trigger_sync(id).unwrap();

    assert!(!result.success);
    assert!(
        result.message.starts_with("Failed to access Git repository: "),
        "{}",
        result.message
    );
    let after = engine.store().get_repository_with_refs(id).unwrap().unwrap();
    assert_eq!(after, before);
}

#[test]
fn never_reachable_remote_leaves_repository_unsynced() {
    let dir = TempDir::new().unwrap();
    let engine = open_engine(dir.path());
    let id = register(&engine, &missing_remote_url());

    let result = engine.trigger_sync(id).unwrap();

    assert!(!result.success);
    let repo = engine.store().get_repository(id).unwrap().unwrap();
    assert_eq!(repo.synced_at, None);
    assert_eq!(repo.default_branch, None);
}

// ============================================================================
// Snapshot behaviour
// ============================================================================

#[test]
fn resync_against_unchanged_remote_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let engine = open_engine(dir.path());
    let remote = RemoteFixture::new("master");
    remote.branch("feature-x").lightweight_tag("v1.0").lightweight_tag("v1.1");
    let id = register(&engine, &remote.url());

    let first = engine.trigger_sync(id).unwrap();
    let second = engine.trigger_sync(id).unwrap();

    let (first_repo, second_repo) = (first.repository.unwrap(), second.repository.unwrap());
    assert_eq!(refs_of(&first_repo), refs_of(&second_repo));
    assert_eq!((first.branch_count, first.tag_count), (2, 2));
    assert_eq!((second.branch_count, second.tag_count), (2, 2));
    assert_eq!(second_repo.default_branch.as_deref(), Some("master"));
    assert!(second_repo.synced_at >= first_repo.synced_at);
}

#[test]
fn resync_follows_remote_changes() {
    let dir = TempDir::new().unwrap();
    let engine = open_engine(dir.path());
    let remote = RemoteFixture::new("main");
    remote.branch("feature-x").branch("old");
    let id = register(&engine, &remote.url());
    engine.trigger_sync(id).unwrap();

    let moved = remote.commit_on("feature-x", "work");
    remote.delete_branch("old");
    let result = engine.trigger_sync(id).unwrap();

    let repo = result.repository.unwrap();
    let names: Vec<_> = repo.branches.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["main", "feature-x"]);
    assert_eq!(repo.branches[1].commit_hash, Some(moved));
}

#[test]
fn annotated_tag_is_stored_with_its_commit() {
    let dir = TempDir::new().unwrap();
    let engine = open_engine(dir.path());
    let remote = RemoteFixture::new("main");
    let tag_object = remote.annotated_tag("v2.0");
    let id = register(&engine, &remote.url());

    let repo = engine.trigger_sync(id).unwrap().repository.unwrap();

    assert_eq!(repo.tags.len(), 1);
    assert_eq!(repo.tags[0].commit_hash, Some(remote.initial_commit()));
    assert_ne!(repo.tags[0].commit_hash, Some(tag_object));
}

#[test]
fn sync_result_serializes_like_the_api_response() {
    let dir = TempDir::new().unwrap();
    let engine = open_engine(dir.path());
    let remote = RemoteFixture::new("main");
    let id = register(&engine, &remote.url());

    let json = serde_json::to_value(engine.trigger_sync(id).unwrap()).unwrap();

    assert_eq!(json["success"], true);
    assert_eq!(json["branch_count"], 1);
    assert_eq!(json["repository"]["remote_url"], remote.url().as_str());
    assert_eq!(json["repository"]["branches"][0]["name"], "main");
}
