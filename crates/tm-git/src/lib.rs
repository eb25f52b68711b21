//! Git transport layer for Test Machine
//!
//! Resolves stored credentials into transport authentication and lists the
//! refs a remote advertises, without touching the local filesystem.

pub mod auth;
pub mod error;
pub mod remote;

pub use auth::{AuthHandle, AuthNegotiator};
pub use error::{Error, Result};
pub use remote::{DEFAULT_REMOTE_TIMEOUT, GitRefLister, RefLister, RemoteRef};
