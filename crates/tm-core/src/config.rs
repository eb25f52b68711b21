//! Engine configuration
//!
//! Settings come from an optional TOML file and are then overridden by
//! environment variables:
//!
//! ```toml
//! database_path = "/var/lib/tm/testmachine.db"
//! remote_timeout_secs = 8
//! require_encryption_key = true
//! ```
//!
//! | Variable | Setting |
//! |----------|---------|
//! | `ENCRYPTION_KEY` | passphrase the credential key is derived from |
//! | `TM_DATABASE_PATH` | SQLite database file |
//! | `TM_REMOTE_TIMEOUT_SECS` | remote ref-listing timeout in seconds |

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tm_git::DEFAULT_REMOTE_TIMEOUT;
use tm_vault::EnvelopeCipher;
use zeroize::Zeroizing;

use crate::{Error, Result};

pub const ENV_ENCRYPTION_KEY: &str = "ENCRYPTION_KEY";
pub const ENV_DATABASE_PATH: &str = "TM_DATABASE_PATH";
pub const ENV_REMOTE_TIMEOUT: &str = "TM_REMOTE_TIMEOUT_SECS";

pub const DEFAULT_DATABASE_PATH: &str = "testmachine.db";

/// Passphrase used when no key is configured.
///
/// Unsafe outside development: anyone with the source can decrypt every
/// stored credential. Set `require_encryption_key = true` in production.
pub const DEVELOPMENT_ENCRYPTION_KEY: &str = "test-management-platform-default-key";

/// On-disk form of the configuration. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    encryption_key: Option<String>,
    remote_timeout_secs: Option<u64>,
    require_encryption_key: bool,
}

/// Where the credential passphrase came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Environment,
    ConfigFile,
    /// Set in code with [`Config::with_encryption_key`]
    Explicit,
    DevelopmentFallback,
}

/// Resolved engine configuration.
#[derive(Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub remote_timeout: Duration,
    /// Refuse to start on the development key
    pub require_encryption_key: bool,
    encryption_key: Option<Zeroizing<String>>,
    key_source: KeySource,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
            require_encryption_key: false,
            encryption_key: None,
            key_source: KeySource::DevelopmentFallback,
        }
    }
}

impl Config {
    /// Load from an optional file, then apply the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigNotFound`] if `path` is given but missing, or a
    /// parse/validation error for malformed values.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, |name| std::env::var(name).ok())
    }

    /// Like [`Config::load`], reading variables through `env`.
    pub fn load_with_env(
        path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let file = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::ConfigNotFound {
                        path: path.to_path_buf(),
                    });
                }
                let content = fs::read_to_string(path)?;
                toml::from_str(&content)?
            }
            None => ConfigFile::default(),
        };
        Self::resolve(file, env)
    }

    /// Parse TOML content without consulting the environment.
    pub fn parse(content: &str) -> Result<Self> {
        Self::resolve(toml::from_str(content)?, |_| None)
    }

    fn resolve(file: ConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self {
            require_encryption_key: file.require_encryption_key,
            ..Self::default()
        };

        if let Some(path) = env(ENV_DATABASE_PATH).filter(|v| !v.is_empty()) {
            config.database_path = PathBuf::from(path);
        } else if let Some(path) = file.database_path {
            config.database_path = path;
        }

        let timeout_secs = match env(ENV_REMOTE_TIMEOUT).filter(|v| !v.is_empty()) {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
                Error::config(format!("{ENV_REMOTE_TIMEOUT} must be a whole number of seconds, got '{raw}'"))
            })?),
            None => file.remote_timeout_secs,
        };
        if let Some(secs) = timeout_secs {
            if secs == 0 {
                return Err(Error::config("remote timeout must be at least one second"));
            }
            config.remote_timeout = Duration::from_secs(secs);
        }

        if let Some(key) = env(ENV_ENCRYPTION_KEY).filter(|v| !v.is_empty()) {
            config.encryption_key = Some(Zeroizing::new(key));
            config.key_source = KeySource::Environment;
        } else if let Some(key) = file.encryption_key.filter(|v| !v.is_empty()) {
            config.encryption_key = Some(Zeroizing::new(key));
            config.key_source = KeySource::ConfigFile;
        }

        Ok(config)
    }

    pub fn key_source(&self) -> KeySource {
        self.key_source
    }

    /// Use `passphrase` as the credential key.
    pub fn with_encryption_key(mut self, passphrase: impl Into<String>) -> Self {
        self.encryption_key = Some(Zeroizing::new(passphrase.into()));
        self.key_source = KeySource::Explicit;
        self
    }

    /// Build the credential cipher from the configured passphrase.
    ///
    /// Falls back to [`DEVELOPMENT_ENCRYPTION_KEY`] with a warning, unless
    /// `require_encryption_key` is set.
    pub fn cipher(&self) -> Result<EnvelopeCipher> {
        match &self.encryption_key {
            Some(key) => Ok(EnvelopeCipher::from_passphrase(key)?),
            None if self.require_encryption_key => Err(Error::config(format!(
                "{ENV_ENCRYPTION_KEY} is not set and require_encryption_key is enabled"
            ))),
            None => {
                tracing::warn!(
                    "{ENV_ENCRYPTION_KEY} is not set; using the built-in development key. \
                     Stored credentials are NOT protected."
                );
                Ok(EnvelopeCipher::from_passphrase(DEVELOPMENT_ENCRYPTION_KEY)?)
            }
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("remote_timeout", &self.remote_timeout)
            .field("require_encryption_key", &self.require_encryption_key)
            .field("key_source", &self.key_source)
            .finish_non_exhaustive()
    }
}
