//! Remote reference listing
//!
//! Uses a detached libgit2 remote, which negotiates with the server and reads
//! the advertised refs without creating a repository, object store or working
//! tree on disk.

use std::sync::{Once, mpsc};
use std::thread;
use std::time::Duration;

use git2::{CertificateCheckStatus, Cred, CredentialType, Direction, Remote, RemoteCallbacks};

use crate::auth::{AuthHandle, SSH_USERNAME};
use crate::{Error, Result};

/// Default bound on a single remote listing.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(8);

/// A reference advertised by a remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRef {
    /// Full ref name, e.g. `refs/heads/main`
    pub name: String,
    /// Hex object id the ref points at
    pub target: String,
}

impl RemoteRef {
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
        }
    }
}

/// Enumerates the refs a remote advertises.
pub trait RefLister: Send + Sync {
    /// List refs in advertisement order.
    ///
    /// Every failure (DNS, connection, rejected credentials, missing
    /// repository, protocol) is reported as [`Error::RemoteAccess`].
    fn list(&self, url: &str, auth: Option<&AuthHandle>) -> Result<Vec<RemoteRef>>;
}

/// [`RefLister`] backed by libgit2.
#[derive(Debug, Clone)]
pub struct GitRefLister {
    timeout: Duration,
}

impl GitRefLister {
    /// Create a lister bounded by `timeout`.
    ///
    /// The first lister in the process also sets libgit2's socket connect and
    /// read timeouts to `timeout`, so a stalled handshake ends inside libgit2
    /// and the worker thread exits with it.
    pub fn new(timeout: Duration) -> Self {
        configure_socket_timeouts(timeout);
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for GitRefLister {
    fn default() -> Self {
        Self::new(DEFAULT_REMOTE_TIMEOUT)
    }
}

impl RefLister for GitRefLister {
    /// Runs the handshake on a worker thread and waits at most `timeout`.
    ///
    /// On timeout the caller stops waiting and the worker's result is dropped
    /// unread. The worker itself ends once libgit2's socket timeout fires.
    fn list(&self, url: &str, auth: Option<&AuthHandle>) -> Result<Vec<RemoteRef>> {
        let (tx, rx) = mpsc::channel();
        let worker_url = url.to_string();
        let worker_auth = auth.cloned();

        thread::Builder::new()
            .name("git-ls-remote".to_string())
            .spawn(move || {
                let _ = tx.send(list_blocking(&worker_url, worker_auth.as_ref()));
            })
            .map_err(|e| Error::remote_access(format!("failed to start remote listing: {e}")))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::warn!(url = %url, timeout_secs = self.timeout.as_secs_f64(), "Remote listing timed out");
                Err(Error::remote_access(format!(
                    "timed out after {:?} waiting for remote",
                    self.timeout
                )))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(Error::remote_access("remote listing worker exited unexpectedly"))
            }
        }
    }
}

static SOCKET_TIMEOUTS: Once = Once::new();

/// Set libgit2's process-wide server timeouts. Only the first call applies.
fn configure_socket_timeouts(timeout: Duration) {
    SOCKET_TIMEOUTS.call_once(|| {
        let millis = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX).max(1);
        // SAFETY: the options are written once, under `Once`. Listings only
        // read them.
        let applied = unsafe {
            git2::opts::set_server_connect_timeout_in_milliseconds(millis)
                .and_then(|()| git2::opts::set_server_timeout_in_milliseconds(millis))
        };
        match applied {
            Ok(()) => tracing::debug!(timeout_ms = millis, "Configured libgit2 socket timeouts"),
            Err(e) => tracing::warn!(error = %e, "Failed to configure libgit2 socket timeouts"),
        }
    });
}

/// Connect to `url` and read its ref advertisement.
pub fn list_blocking(url: &str, auth: Option<&AuthHandle>) -> Result<Vec<RemoteRef>> {
    let mut remote = Remote::create_detached(url)?;
    let callbacks = callbacks(auth);

    let connection = remote.connect_auth(Direction::Fetch, Some(callbacks), None)?;
    let refs: Vec<RemoteRef> = connection
        .list()?
        .iter()
        .map(|head| RemoteRef::new(head.name(), head.oid().to_string()))
        .collect();

    tracing::debug!(url = %url, ref_count = refs.len(), "Listed remote refs");
    Ok(refs)
}

fn callbacks(auth: Option<&AuthHandle>) -> RemoteCallbacks<'_> {
    let mut callbacks = RemoteCallbacks::new();
    let mut secret_attempts = 0u32;

    callbacks.credentials(move |_url, username_from_url, allowed| {
        if allowed.contains(CredentialType::USERNAME) {
            let username = username_from_url
                .or(auth.map(AuthHandle::username))
                .unwrap_or(SSH_USERNAME);
            return Cred::username(username);
        }

        // libgit2 calls back again after a rejection; one try per secret.
        secret_attempts += 1;
        if secret_attempts > 1 {
            return Err(git2::Error::from_str("authentication rejected by remote"));
        }

        match auth {
            Some(AuthHandle::SshKey {
                username,
                private_key,
            }) if allowed.contains(CredentialType::SSH_KEY) => Cred::ssh_key_from_memory(
                username_from_url.unwrap_or(username),
                None,
                private_key,
                None,
            ),
            Some(AuthHandle::BasicAuth { username, password })
                if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) =>
            {
                Cred::userpass_plaintext(username, password)
            }
            Some(handle) => Err(git2::Error::from_str(&format!(
                "remote does not accept {} credentials",
                handle.kind()
            ))),
            None => Err(git2::Error::from_str(
                "remote requires authentication but no credential is configured",
            )),
        }
    });

    // SSH host keys are accepted without verification. TLS certificates keep
    // libgit2's own validation.
    callbacks.certificate_check(|cert, _host| {
        if cert.as_hostkey().is_some() {
            Ok(CertificateCheckStatus::CertificateOk)
        } else {
            Ok(CertificateCheckStatus::CertificatePassthrough)
        }
    });

    callbacks
}
