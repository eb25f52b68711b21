//! Credential vault service
//!
//! Pairs a [`CredentialStore`] with an [`EnvelopeCipher`]: plaintext goes in
//! on create/update, is sealed before it reaches the store, and only comes
//! back out through [`CredentialVault::unseal`].

use std::fmt;
use std::sync::Arc;

use zeroize::Zeroizing;

use crate::cipher::EnvelopeCipher;
use crate::credential::{Credential, CredentialUpdate, NewCredential};
use crate::store::CredentialStore;
use crate::{Error, Result};

/// A credential together with its decrypted secret.
pub struct UnsealedCredential {
    pub credential: Credential,
    secret: Zeroizing<String>,
}

impl UnsealedCredential {
    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn into_secret(self) -> Zeroizing<String> {
        self.secret
    }
}

impl fmt::Debug for UnsealedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnsealedCredential")
            .field("credential", &self.credential)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Credential CRUD with envelope encryption.
#[derive(Clone)]
pub struct CredentialVault {
    store: Arc<dyn CredentialStore>,
    cipher: Arc<EnvelopeCipher>,
}

impl CredentialVault {
    pub fn new(store: Arc<dyn CredentialStore>, cipher: Arc<EnvelopeCipher>) -> Self {
        Self { store, cipher }
    }

    /// Validate, seal the secret and persist a new credential.
    pub fn create(&self, request: &NewCredential) -> Result<Credential> {
        let draft = request.validate()?;
        let sealed = self.cipher.encrypt(&request.secret)?;
        let credential = self.store.insert_credential(&draft, &sealed)?;

        tracing::info!(
            credential_id = credential.id,
            kind = %credential.kind,
            "Created credential"
        );
        Ok(credential)
    }

    /// Update a credential, re-encrypting the secret if a new one is supplied.
    pub fn update(&self, id: i64, request: &CredentialUpdate) -> Result<Credential> {
        let existing = self.get(id)?;
        let changes = request.validate(existing.kind)?;
        let sealed = match &request.secret {
            Some(secret) => Some(self.cipher.encrypt(secret)?),
            None => None,
        };

        let updated = self
            .store
            .update_credential(id, &changes, sealed.as_ref())?
            .ok_or(Error::NotFound { id })?;

        tracing::info!(
            credential_id = id,
            rotated_secret = sealed.is_some(),
            "Updated credential"
        );
        Ok(updated)
    }

    pub fn get(&self, id: i64) -> Result<Credential> {
        self.store.get_credential(id)?.ok_or(Error::NotFound { id })
    }

    pub fn list(&self) -> Result<Vec<Credential>> {
        self.store.list_credentials()
    }

    /// Delete a credential. The caller has already checked that no repository uses it.
    pub fn delete(&self, id: i64) -> Result<()> {
        if !self.store.delete_credential(id)? {
            return Err(Error::NotFound { id });
        }
        tracing::info!(credential_id = id, "Deleted credential");
        Ok(())
    }

    /// Load a credential and decrypt its secret.
    pub fn unseal(&self, id: i64) -> Result<UnsealedCredential> {
        let credential = self.get(id)?;
        let sealed = self
            .store
            .sealed_secret(id)?
            .ok_or(Error::NotFound { id })?;

        let secret = self.cipher.decrypt(&sealed).inspect_err(|e| {
            tracing::error!(credential_id = id, error = %e, "Failed to decrypt credential");
        })?;

        Ok(UnsealedCredential { credential, secret })
    }
}

impl fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialVault").finish_non_exhaustive()
    }
}
