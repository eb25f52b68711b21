//! Credential vault behaviour across engine restarts

use std::path::Path;

use tempfile::TempDir;
use tm_core::{Config, Engine, KeySource};
use tm_vault::{CredentialKind, CredentialUpdate, NewCredential};

fn config_for(dir: &Path, key: Option<&str>) -> Config {
    let db = dir.join("tm.db").to_string_lossy().into_owned();
    let key = key.map(str::to_string);
    Config::load_with_env(None, move |name| match name {
        "TM_DATABASE_PATH" => Some(db.clone()),
        "ENCRYPTION_KEY" => key.clone(),
        _ => None,
    })
    .unwrap()
}

#[test]
fn secrets_survive_restart_with_same_key() {
    let dir = TempDir::new().unwrap();
    let id = {
        let engine = Engine::open(&config_for(dir.path(), Some("k1"))).unwrap();
        engine
            .vault()
            .create(&NewCredential::new("ci", CredentialKind::BasicAuth, "s3cret").with_username("bot"))
            .unwrap()
            .id
    };

    let engine = Engine::open(&config_for(dir.path(), Some("k1"))).unwrap();
    let unsealed = engine.vault().unseal(id).unwrap();

    assert_eq!(unsealed.secret(), "s3cret");
    assert_eq!(unsealed.credential.username.as_deref(), Some("bot"));
}

#[test]
fn restart_with_other_key_cannot_decrypt() {
    let dir = TempDir::new().unwrap();
    let id = Engine::open(&config_for(dir.path(), Some("k1")))
        .unwrap()
        .vault()
        .create(&NewCredential::new("ci", CredentialKind::BasicAuth, "s3cret").with_username("bot"))
        .unwrap()
        .id;

    let engine = Engine::open(&config_for(dir.path(), Some("k2"))).unwrap();

    let err = engine.vault().unseal(id).unwrap_err();
    assert!(matches!(err, tm_vault::Error::Decryption { .. }), "got {err:?}");
    assert!(!err.to_string().contains("s3cret"));
    // Metadata stays readable without the key.
    assert_eq!(engine.vault().get(id).unwrap().name, "ci");
}

#[test]
fn development_fallback_is_reported_and_still_works() {
    let dir = TempDir::new().unwrap();
    let config = config_for(dir.path(), None);
    assert_eq!(config.key_source(), KeySource::DevelopmentFallback);

    let engine = Engine::open(&config).unwrap();
    let id = engine
        .vault()
        .create(&NewCredential::new("ci", CredentialKind::BasicAuth, "pw").with_username("bot"))
        .unwrap()
        .id;

    assert_eq!(engine.vault().unseal(id).unwrap().secret(), "pw");
}

#[test]
fn rotating_a_secret_replaces_it_after_restart() {
    let dir = TempDir::new().unwrap();
    let engine = Engine::open(&config_for(dir.path(), Some("k1"))).unwrap();
    let id = engine
        .vault()
        .create(&NewCredential::new("ci", CredentialKind::BasicAuth, "old").with_username("bot"))
        .unwrap()
        .id;
    engine
        .vault()
        .update(id, &CredentialUpdate::new("ci").with_username("bot").with_secret("new"))
        .unwrap();
    drop(engine);

    let engine = Engine::open(&config_for(dir.path(), Some("k1"))).unwrap();

    assert_eq!(engine.vault().unseal(id).unwrap().secret(), "new");
}
