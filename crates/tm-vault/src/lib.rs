//! Credential vault for Test Machine
//!
//! Stores third-party Git credentials under envelope encryption:
//!
//! - [`cipher`]: AES-256-GCM sealing under a passphrase-derived key
//! - [`credential`]: credential records, kinds and validation
//! - [`store`]: the [`CredentialStore`] persistence seam
//! - [`vault`]: [`CredentialVault`], the service callers use

pub mod cipher;
pub mod credential;
pub mod error;
pub mod store;
pub mod vault;

pub use cipher::{EnvelopeCipher, SealedSecret};
pub use credential::{
    Credential, CredentialChanges, CredentialDraft, CredentialKind, CredentialUpdate,
    NewCredential,
};
pub use error::{Error, Result};
pub use store::CredentialStore;
pub use vault::{CredentialVault, UnsealedCredential};
