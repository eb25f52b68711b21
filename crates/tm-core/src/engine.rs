//! Wiring of every component from configuration

use std::sync::Arc;

use tm_git::{AuthNegotiator, GitRefLister, RefLister};
use tm_store::SqliteStore;
use tm_vault::{CredentialVault, EnvelopeCipher};

use crate::config::Config;
use crate::sync::{RepositorySynchronizer, SyncResult};
use crate::{Error, Result};

/// The engine's single entry point for callers.
///
/// Owns the store, the credential vault and the synchronizer. The cipher is
/// built once here and shared by reference with everything that needs it.
pub struct Engine {
    store: Arc<SqliteStore>,
    vault: CredentialVault,
    synchronizer: RepositorySynchronizer,
}

impl Engine {
    /// Open the configured database and build every component.
    pub fn open(config: &Config) -> Result<Self> {
        let cipher = Arc::new(config.cipher()?);
        let store = Arc::new(SqliteStore::open(&config.database_path)?);
        let lister = Arc::new(GitRefLister::new(config.remote_timeout));
        tracing::debug!(?config, "Engine configured");
        Ok(Self::from_parts(store, cipher, lister))
    }

    /// Assemble an engine from pre-built parts.
    pub fn from_parts(
        store: Arc<SqliteStore>,
        cipher: Arc<EnvelopeCipher>,
        lister: Arc<dyn RefLister>,
    ) -> Self {
        let vault = CredentialVault::new(store.clone(), cipher);
        let synchronizer =
            RepositorySynchronizer::new(store.clone(), AuthNegotiator::new(vault.clone()), lister);
        Self {
            store,
            vault,
            synchronizer,
        }
    }

    /// Sync a repository. See [`RepositorySynchronizer::sync`].
    pub fn trigger_sync(&self, repository_id: i64) -> Result<SyncResult> {
        self.synchronizer.sync(repository_id)
    }

    /// Delete a credential that no repository references.
    pub fn delete_credential(&self, id: i64) -> Result<()> {
        let repository_ids = self.store.repositories_using_credential(id)?;
        if !repository_ids.is_empty() {
            return Err(Error::CredentialInUse { id, repository_ids });
        }
        self.vault.delete(id)?;
        Ok(())
    }

    pub fn vault(&self) -> &CredentialVault {
        &self.vault
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }
}
