//! Transport authentication resolved from stored credentials

use std::fmt;

use tm_vault::{CredentialKind, CredentialVault};
use zeroize::Zeroizing;

use crate::{Error, Result};

/// User name presented to SSH remotes.
pub const SSH_USERNAME: &str = "git";

/// Protocol-specific authentication for one remote operation.
#[derive(Clone)]
pub enum AuthHandle {
    /// Key-based SSH transport
    SshKey {
        username: String,
        private_key: Zeroizing<String>,
    },
    /// HTTP basic authentication
    BasicAuth {
        username: String,
        password: Zeroizing<String>,
    },
}

impl AuthHandle {
    pub fn username(&self) -> &str {
        match self {
            AuthHandle::SshKey { username, .. } | AuthHandle::BasicAuth { username, .. } => {
                username
            }
        }
    }

    pub fn kind(&self) -> CredentialKind {
        match self {
            AuthHandle::SshKey { .. } => CredentialKind::SshKey,
            AuthHandle::BasicAuth { .. } => CredentialKind::BasicAuth,
        }
    }
}

impl fmt::Debug for AuthHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthHandle::SshKey { .. } => "SshKey",
            AuthHandle::BasicAuth { .. } => "BasicAuth",
        };
        f.debug_struct(name)
            .field("username", &self.username())
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Turns a repository's credential reference into an [`AuthHandle`].
#[derive(Debug, Clone)]
pub struct AuthNegotiator {
    vault: CredentialVault,
}

impl AuthNegotiator {
    pub fn new(vault: CredentialVault) -> Self {
        Self { vault }
    }

    /// Resolve authentication for a remote.
    ///
    /// `None` means the repository is public and yields no handle.
    pub fn resolve(&self, credential_id: Option<i64>) -> Result<Option<AuthHandle>> {
        let Some(id) = credential_id else {
            tracing::debug!("No credential configured, connecting anonymously");
            return Ok(None);
        };

        let unsealed = self.vault.unseal(id)?;
        let kind = unsealed.credential.kind;
        let username = unsealed.credential.username.clone();
        let secret = unsealed.into_secret();

        let handle = match kind {
            CredentialKind::SshKey => {
                check_private_key(&secret)?;
                AuthHandle::SshKey {
                    username: SSH_USERNAME.to_string(),
                    private_key: secret,
                }
            }
            CredentialKind::BasicAuth => {
                let username = username
                    .filter(|u| !u.trim().is_empty())
                    .ok_or_else(|| Error::auth("username is required for basic auth credentials"))?;
                AuthHandle::BasicAuth {
                    username,
                    password: secret,
                }
            }
        };

        tracing::debug!(credential_id = id, kind = %kind, "Resolved transport authentication");
        Ok(Some(handle))
    }
}

/// Check that `text` looks like an unencrypted PEM or OpenSSH private key.
///
/// libgit2 only parses the key during the handshake, which would surface a
/// malformed key as a remote failure; this catches it while resolving.
pub fn check_private_key(text: &str) -> Result<()> {
    let text = text.trim();
    let armored = text.starts_with("-----BEGIN ")
        && text.lines().next().is_some_and(|l| l.ends_with("PRIVATE KEY-----"))
        && text.lines().last().is_some_and(|l| l.starts_with("-----END "));
    if !armored {
        return Err(Error::auth(
            "failed to parse SSH private key: expected a PEM or OpenSSH private key",
        ));
    }
    if text.contains("Proc-Type: 4,ENCRYPTED") || text.starts_with("-----BEGIN ENCRYPTED") {
        return Err(Error::auth(
            "passphrase-protected SSH keys are not supported",
        ));
    }
    Ok(())
}
