//! Storage seam for credential records

use crate::Result;
use crate::cipher::SealedSecret;
use crate::credential::{Credential, CredentialChanges, CredentialDraft};

/// Persistence for credential rows.
///
/// Implementations are encryption-agnostic: they receive already sealed
/// secrets and hand them back untouched. Only [`CredentialStore::sealed_secret`]
/// ever returns ciphertext; every other read path returns [`Credential`],
/// which has no ciphertext field.
///
/// Referential integrity (refusing to delete a credential a repository still
/// uses) is the caller's responsibility.
pub trait CredentialStore: Send + Sync {
    /// Insert a new credential row.
    fn insert_credential(&self, draft: &CredentialDraft, secret: &SealedSecret)
    -> Result<Credential>;

    /// Update the non-secret fields and, when `secret` is given, the ciphertext.
    ///
    /// Returns `Ok(None)` if no credential has this id.
    fn update_credential(
        &self,
        id: i64,
        changes: &CredentialChanges,
        secret: Option<&SealedSecret>,
    ) -> Result<Option<Credential>>;

    /// Fetch a credential by id.
    fn get_credential(&self, id: i64) -> Result<Option<Credential>>;

    /// All credentials, newest first.
    fn list_credentials(&self) -> Result<Vec<Credential>>;

    /// Raw ciphertext for one credential, for decryption by the auth layer.
    fn sealed_secret(&self, id: i64) -> Result<Option<SealedSecret>>;

    /// Delete a credential. Returns `false` if it did not exist.
    fn delete_credential(&self, id: i64) -> Result<bool>;
}
