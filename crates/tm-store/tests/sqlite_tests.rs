use std::sync::Arc;

use pretty_assertions::assert_eq;
use rstest::rstest;
use tm_store::{Error, NewRepository, RepositoryStore, RepositoryUpdate, SqliteStore};
use tm_test_utils::vault::{SAMPLE_SSH_KEY, test_cipher};
use tm_vault::{CredentialKind, CredentialUpdate, CredentialVault, NewCredential};

fn vault_over(store: &Arc<SqliteStore>) -> CredentialVault {
    CredentialVault::new(store.clone(), test_cipher())
}

fn store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::open_in_memory().unwrap())
}

// ============================================================================
// Repositories
// ============================================================================

#[test]
fn create_and_get_repository() {
    let store = store();
    let created = store
        .create_repository(
            &NewRepository::new("  api  ", "git@example.com:team/api.git")
                .with_description("backend"),
        )
        .unwrap();

    assert_eq!(created.name, "api");
    assert_eq!(created.remote_url, "git@example.com:team/api.git");
    assert_eq!(created.description.as_deref(), Some("backend"));
    assert_eq!(created.default_branch, None);
    assert_eq!(created.synced_at, None);

    let fetched = store.get_repository(created.id).unwrap().unwrap();
    assert_eq!(fetched, created);
}

#[rstest]
#[case::empty_name("", "https://example.com/a.git", "repository name is required")]
#[case::blank_name("   ", "https://example.com/a.git", "repository name is required")]
#[case::empty_url("a", "", "remote URL is required")]
fn create_repository_rejects_missing_fields(
    #[case] name: &str,
    #[case] url: &str,
    #[case] expected: &str,
) {
    let err = store()
        .create_repository(&NewRepository::new(name, url))
        .unwrap_err();

    assert!(matches!(err, Error::Validation { .. }));
    assert!(err.to_string().contains(expected), "got: {err}");
}

#[test]
fn list_repositories_newest_first() {
    let store = store();
    let first = store
        .create_repository(&NewRepository::new("one", "https://example.com/1.git"))
        .unwrap();
    let second = store
        .create_repository(&NewRepository::new("two", "https://example.com/2.git"))
        .unwrap();

    let ids: Vec<_> = store.list_repositories().unwrap().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[test]
fn update_repository_keeps_remote_url() {
    let store = store();
    let repo = store
        .create_repository(&NewRepository::new("one", "https://example.com/1.git"))
        .unwrap();

    let updated = store
        .update_repository(
            repo.id,
            &RepositoryUpdate {
                name: "renamed".to_string(),
                description: Some("docs".to_string()),
                credential_id: None,
            },
        )
        .unwrap();

    assert_eq!(updated.name, "renamed");
    assert_eq!(updated.description.as_deref(), Some("docs"));
    assert_eq!(updated.remote_url, repo.remote_url);
}

#[test]
fn update_and_delete_unknown_repository() {
    let store = store();
    let update = RepositoryUpdate {
        name: "x".to_string(),
        description: None,
        credential_id: None,
    };

    assert!(matches!(
        store.update_repository(7, &update),
        Err(Error::NotFound { id: 7, .. })
    ));
    assert!(matches!(
        store.delete_repository(7),
        Err(Error::NotFound { id: 7, .. })
    ));
    assert!(store.get_repository_with_refs(7).unwrap().is_none());
}

#[test]
fn repository_cannot_reference_missing_credential() {
    let err = store()
        .create_repository(
            &NewRepository::new("one", "https://example.com/1.git").with_credential(42),
        )
        .unwrap_err();

    assert!(matches!(err, Error::Constraint { .. }), "got {err:?}");
}

// ============================================================================
// Credentials through the vault
// ============================================================================

#[test]
fn vault_round_trips_secret_through_sqlite() {
    let store = store();
    let vault = vault_over(&store);

    let created = vault
        .create(&NewCredential::new("ci", CredentialKind::BasicAuth, "hunter2").with_username("bot"))
        .unwrap();
    let unsealed = vault.unseal(created.id).unwrap();

    assert_eq!(unsealed.credential, created);
    assert_eq!(unsealed.secret(), "hunter2");
}

#[test]
fn stored_ciphertext_is_not_plaintext_and_not_serialized() {
    let store = store();
    let vault = vault_over(&store);
    let created = vault
        .create(&NewCredential::new("deploy", CredentialKind::SshKey, SAMPLE_SSH_KEY))
        .unwrap();

    let sealed = tm_vault::CredentialStore::sealed_secret(store.as_ref(), created.id)
        .unwrap()
        .unwrap();
    assert!(!sealed.as_str().contains("OPENSSH"));

    let json = serde_json::to_string(&vault.get(created.id).unwrap()).unwrap();
    assert!(!json.contains(sealed.as_str()));
    assert!(!json.contains("ciphertext"));
}

#[test]
fn update_without_secret_keeps_ciphertext() {
    let store = store();
    let vault = vault_over(&store);
    let created = vault
        .create(&NewCredential::new("ci", CredentialKind::BasicAuth, "old").with_username("bot"))
        .unwrap();

    let updated = vault
        .update(created.id, &CredentialUpdate::new("ci-renamed").with_username("bot2"))
        .unwrap();
    assert_eq!(updated.name, "ci-renamed");
    assert_eq!(updated.username.as_deref(), Some("bot2"));
    assert_eq!(vault.unseal(created.id).unwrap().secret(), "old");

    vault
        .update(
            created.id,
            &CredentialUpdate::new("ci-renamed")
                .with_username("bot2")
                .with_secret("new"),
        )
        .unwrap();
    assert_eq!(vault.unseal(created.id).unwrap().secret(), "new");
}

#[test]
fn vault_reports_missing_credential() {
    let store = store();
    let vault = vault_over(&store);

    assert!(matches!(vault.get(9), Err(tm_vault::Error::NotFound { id: 9 })));
    assert!(matches!(vault.delete(9), Err(tm_vault::Error::NotFound { id: 9 })));
    assert!(matches!(vault.unseal(9), Err(tm_vault::Error::NotFound { id: 9 })));
}

#[test]
fn credential_in_use_cannot_be_deleted() {
    let store = store();
    let vault = vault_over(&store);
    let credential = vault
        .create(&NewCredential::new("ci", CredentialKind::BasicAuth, "pw").with_username("bot"))
        .unwrap();
    let repo = store
        .create_repository(
            &NewRepository::new("api", "https://example.com/api.git")
                .with_credential(credential.id),
        )
        .unwrap();

    assert_eq!(store.repositories_using_credential(credential.id).unwrap(), vec![repo.id]);
    let err = vault.delete(credential.id).unwrap_err();
    assert!(matches!(err, tm_vault::Error::Storage(_)), "got {err:?}");
    assert!(vault.get(credential.id).is_ok());

    store.delete_repository(repo.id).unwrap();
    vault.delete(credential.id).unwrap();
    assert!(store.repositories_using_credential(credential.id).unwrap().is_empty());
}

#[rstest]
#[case::legacy_ssh("RSA", None, CredentialKind::SshKey)]
#[case::legacy_login("Login", Some("bot"), CredentialKind::BasicAuth)]
#[case::current_ssh("ssh_key", None, CredentialKind::SshKey)]
fn imported_kinds_are_normalized(
    #[case] stored_kind: &str,
    #[case] username: Option<&str>,
    #[case] expected: CredentialKind,
) {
    let store = store();
    let vault = vault_over(&store);
    let sealed = test_cipher().encrypt("secret").unwrap();

    let id = store
        .import_credential("legacy", stored_kind, username, &sealed)
        .unwrap();

    let unsealed = vault.unseal(id).unwrap();
    assert_eq!(unsealed.credential.kind, expected);
    assert_eq!(unsealed.secret(), "secret");
}

#[test]
fn unknown_stored_kind_is_unsupported() {
    let store = store();
    let vault = vault_over(&store);
    let sealed = test_cipher().encrypt("secret").unwrap();
    let id = store.import_credential("odd", "gpg", None, &sealed).unwrap();

    let err = vault.get(id).unwrap_err();

    assert!(
        matches!(&err, tm_vault::Error::UnsupportedCredentialKind { kind } if kind == "gpg"),
        "got {err:?}"
    );
}
