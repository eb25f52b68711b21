//! Tests for the transactional branch/tag snapshot replace

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tm_store::{
    BranchRecord, Error, NewRepository, RefReplacement, RepositoryStore, SqliteStore, TagRecord,
};

fn branch(name: &str, hash: &str, is_default: bool) -> BranchRecord {
    BranchRecord {
        name: name.to_string(),
        commit_hash: Some(hash.to_string()),
        is_default,
    }
}

fn tag(name: &str, hash: &str) -> TagRecord {
    TagRecord {
        name: name.to_string(),
        commit_hash: Some(hash.to_string()),
    }
}

fn initial_snapshot() -> RefReplacement {
    RefReplacement {
        branches: vec![branch("main", "abc123", true), branch("feature-x", "def456", false)],
        tags: vec![tag("v1.0", "abc123")],
        default_branch: Some("main".to_string()),
        synced_at: Utc::now(),
    }
}

fn setup() -> (TempDir, SqliteStore, i64) {
    let dir = TempDir::new().unwrap();
    let store = SqliteStore::open(dir.path().join("store.db")).unwrap();
    let repo = store
        .create_repository(&NewRepository::new("app", "https://example.com/app.git"))
        .unwrap();
    (dir, store, repo.id)
}

#[test]
fn replace_writes_snapshot_and_sync_metadata() {
    let (_dir, store, id) = setup();
    let snapshot = initial_snapshot();

    let repo = store.replace_branches_and_tags(id, &snapshot).unwrap();

    assert_eq!(repo.default_branch.as_deref(), Some("main"));
    assert_eq!(repo.synced_at, Some(snapshot.synced_at));
    let branches: Vec<_> = repo.branches.iter().map(|b| (b.name.as_str(), b.is_default)).collect();
    assert_eq!(branches, vec![("main", true), ("feature-x", false)]);
    assert_eq!(repo.tags.len(), 1);
    assert_eq!(repo.tags[0].commit_hash.as_deref(), Some("abc123"));
}

#[test]
fn replace_drops_refs_missing_from_new_snapshot() {
    let (_dir, store, id) = setup();
    store.replace_branches_and_tags(id, &initial_snapshot()).unwrap();

    let next = RefReplacement {
        branches: vec![branch("master", "fff000", true)],
        tags: vec![],
        default_branch: Some("master".to_string()),
        synced_at: Utc::now(),
    };
    let repo = store.replace_branches_and_tags(id, &next).unwrap();

    let names: Vec<_> = repo.branches.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["master"]);
    assert!(repo.tags.is_empty());
    assert_eq!(repo.default_branch.as_deref(), Some("master"));
}

#[test]
fn failed_tag_insert_leaves_previous_snapshot_intact() {
    let (_dir, store, id) = setup();
    store.replace_branches_and_tags(id, &initial_snapshot()).unwrap();
    let before = store.get_repository_with_refs(id).unwrap().unwrap();

    // Branches stage fine; the duplicate tag violates UNIQUE(repository_id, name).
    let broken = RefReplacement {
        branches: vec![branch("develop", "999999", false)],
        tags: vec![tag("v2.0", "111111"), tag("v2.0", "222222")],
        default_branch: None,
        synced_at: Utc::now() + Duration::seconds(60),
    };
    let err = store.replace_branches_and_tags(id, &broken).unwrap_err();

    assert!(matches!(err, Error::Constraint { .. }), "got {:?}", err);
    assert!(err.to_string().contains("v2.0"));
    let after = store.get_repository_with_refs(id).unwrap().unwrap();
    assert_eq!(after, before);
}

#[test]
fn replace_of_unknown_repository_is_not_found() {
    let (_dir, store, _id) = setup();

    let err = store
        .replace_branches_and_tags(404, &initial_snapshot())
        .unwrap_err();

    assert!(matches!(
        err,
        Error::NotFound {
            entity: "repository",
            id: 404
        }
    ));
}

#[test]
fn replace_only_touches_its_own_repository() {
    let (_dir, store, id) = setup();
    let other = store
        .create_repository(&NewRepository::new("lib", "https://example.com/lib.git"))
        .unwrap();
    store.replace_branches_and_tags(other.id, &initial_snapshot()).unwrap();
    let other_before = store.get_repository_with_refs(other.id).unwrap().unwrap();

    store.replace_branches_and_tags(id, &initial_snapshot()).unwrap();

    assert_eq!(store.get_repository_with_refs(other.id).unwrap().unwrap(), other_before);
}

#[test]
fn deleting_repository_cascades_to_refs() {
    let (_dir, store, id) = setup();
    store.replace_branches_and_tags(id, &initial_snapshot()).unwrap();

    store.delete_repository(id).unwrap();

    assert!(store.get_repository(id).unwrap().is_none());
    assert!(store.branches(id).unwrap().is_empty());
    assert!(store.tags(id).unwrap().is_empty());
}

#[test]
fn snapshot_is_visible_to_a_second_connection() {
    let (dir, store, id) = setup();
    store.replace_branches_and_tags(id, &initial_snapshot()).unwrap();

    let reader = SqliteStore::open(dir.path().join("store.db")).unwrap();
    let repo = reader.get_repository_with_refs(id).unwrap().unwrap();

    assert_eq!(repo.branches.len(), 2);
    assert_eq!(repo.tags.len(), 1);
}
