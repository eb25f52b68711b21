//! Envelope cipher for credential secrets
//!
//! Secrets are sealed with AES-256-GCM under a key derived from a
//! process-level passphrase. The stored blob is
//! `base64(nonce || ciphertext || tag)` so it can live in any text column.

use std::fmt;

use aes_gcm::aead::{Aead, AeadCore, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, Zeroizing};

use crate::{Error, Result};

/// Size of the random nonce prefixed to every sealed blob.
pub const NONCE_LEN: usize = 12;

/// Size of the GCM authentication tag appended to the ciphertext.
pub const TAG_LEN: usize = 16;

/// An encrypted secret as persisted by a credential store.
///
/// The contents are opaque; the only way back to plaintext is
/// [`EnvelopeCipher::decrypt`].
#[derive(Clone, PartialEq, Eq)]
pub struct SealedSecret(String);

impl SealedSecret {
    /// Wrap a blob previously produced by [`EnvelopeCipher::encrypt`] and read back from storage.
    pub fn from_stored(blob: impl Into<String>) -> Self {
        Self(blob.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for SealedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SealedSecret(<{} bytes>)", self.0.len())
    }
}

/// Symmetric AEAD cipher bound to one derived key.
///
/// Construct once at startup and share it by reference (or `Arc`) with every
/// component that seals or opens secrets. Safe to use from many threads at
/// once: each `encrypt` draws an independent nonce from the OS RNG.
pub struct EnvelopeCipher {
    aead: Aes256Gcm,
}

impl EnvelopeCipher {
    /// Derive a 256-bit key by hashing `passphrase` with SHA-256.
    pub fn from_passphrase(passphrase: &str) -> Result<Self> {
        if passphrase.is_empty() {
            return Err(Error::Encryption {
                message: "passphrase must not be empty".to_string(),
            });
        }

        let digest = Sha256::digest(passphrase.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);

        let aead = Aes256Gcm::new_from_slice(&key).map_err(|e| Error::Encryption {
            message: format!("invalid key length: {e}"),
        });
        key.zeroize();

        Ok(Self { aead: aead? })
    }

    /// Seal `plaintext` under a fresh random nonce.
    ///
    /// Two calls with the same input produce different blobs.
    pub fn encrypt(&self, plaintext: &str) -> Result<SealedSecret> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .aead
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| Error::Encryption {
                message: "AEAD seal failed".to_string(),
            })?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&ciphertext);

        Ok(SealedSecret(STANDARD.encode(blob)))
    }

    /// Open a sealed blob.
    ///
    /// Fails with [`Error::Decryption`] when the blob is not base64, is shorter
    /// than a nonce, or does not authenticate under this key.
    pub fn decrypt(&self, sealed: &SealedSecret) -> Result<Zeroizing<String>> {
        let data = Zeroizing::new(
            STANDARD
                .decode(sealed.as_str())
                .map_err(|e| Error::decryption(format!("ciphertext is not valid base64: {e}")))?,
        );

        if data.len() < NONCE_LEN {
            return Err(Error::decryption("ciphertext too short"));
        }

        let (nonce, body) = data.split_at(NONCE_LEN);
        let plaintext = self
            .aead
            .decrypt(Nonce::from_slice(nonce), body)
            .map_err(|_| Error::decryption("authentication failed; wrong key or corrupted data"))?;

        match String::from_utf8(plaintext) {
            Ok(text) => Ok(Zeroizing::new(text)),
            Err(e) => {
                let mut bytes = e.into_bytes();
                bytes.zeroize();
                Err(Error::decryption("plaintext is not valid UTF-8"))
            }
        }
    }
}

impl fmt::Debug for EnvelopeCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvelopeCipher").finish_non_exhaustive()
    }
}
