//! Credential records and their validation rules

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::{Error, Result};

/// How a credential authenticates against a Git remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    /// Private key for the SSH transport
    SshKey,
    /// Username + password/token for the HTTP transport
    BasicAuth,
}

impl CredentialKind {
    /// Canonical name used when persisting the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKind::SshKey => "ssh_key",
            CredentialKind::BasicAuth => "basic_auth",
        }
    }

    /// Whether records of this kind must carry a username.
    pub fn requires_username(&self) -> bool {
        matches!(self, CredentialKind::BasicAuth)
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CredentialKind {
    type Err = Error;

    /// Accepts the canonical names plus the legacy `RSA` / `Login` labels.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ssh_key" | "RSA" => Ok(CredentialKind::SshKey),
            "basic_auth" | "Login" => Ok(CredentialKind::BasicAuth),
            other => Err(Error::UnsupportedCredentialKind {
                kind: other.to_string(),
            }),
        }
    }
}

/// A stored credential as seen by every read path.
///
/// Has no ciphertext field; serializing it never exposes the sealed secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub kind: CredentialKind,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Non-secret fields of a credential about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialDraft {
    pub name: String,
    pub description: Option<String>,
    pub kind: CredentialKind,
    pub username: Option<String>,
}

/// Non-secret fields written by a credential update. The kind never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialChanges {
    pub name: String,
    pub description: Option<String>,
    pub username: Option<String>,
}

/// Request to create a credential; the plaintext secret is supplied exactly once.
pub struct NewCredential {
    pub name: String,
    pub description: Option<String>,
    pub kind: CredentialKind,
    pub username: Option<String>,
    pub secret: Zeroizing<String>,
}

impl NewCredential {
    pub fn new(name: impl Into<String>, kind: CredentialKind, secret: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind,
            username: None,
            secret: Zeroizing::new(secret.into()),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check the request and split off the non-secret part.
    pub fn validate(&self) -> Result<CredentialDraft> {
        let name = required_name(&self.name)?;
        if self.secret.is_empty() {
            return Err(Error::validation("secret is required"));
        }
        let username = username_for(self.kind, self.username.as_deref())?;

        Ok(CredentialDraft {
            name,
            description: normalize(self.description.as_deref()),
            kind: self.kind,
            username,
        })
    }
}

impl fmt::Debug for NewCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewCredential")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("kind", &self.kind)
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Request to update a credential.
///
/// `secret: None` keeps the stored ciphertext; `Some` re-encrypts.
pub struct CredentialUpdate {
    pub name: String,
    pub description: Option<String>,
    pub username: Option<String>,
    pub secret: Option<Zeroizing<String>>,
}

impl CredentialUpdate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            username: None,
            secret: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(Zeroizing::new(secret.into()));
        self
    }

    /// Check the update against the kind of the credential being changed.
    pub fn validate(&self, kind: CredentialKind) -> Result<CredentialChanges> {
        let name = required_name(&self.name)?;
        if let Some(secret) = &self.secret
            && secret.is_empty()
        {
            return Err(Error::validation("secret must not be empty when provided"));
        }
        let username = username_for(kind, self.username.as_deref())?;

        Ok(CredentialChanges {
            name,
            description: normalize(self.description.as_deref()),
            username,
        })
    }
}

impl fmt::Debug for CredentialUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialUpdate")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("username", &self.username)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn required_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("name is required"));
    }
    Ok(name.to_string())
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Enforce "username present iff basic auth".
fn username_for(kind: CredentialKind, username: Option<&str>) -> Result<Option<String>> {
    let username = normalize(username);
    match (kind.requires_username(), username) {
        (true, None) => Err(Error::validation(
            "username is required for basic auth credentials",
        )),
        (false, Some(_)) => Err(Error::validation(
            "username is only valid for basic auth credentials",
        )),
        (_, username) => Ok(username),
    }
}
