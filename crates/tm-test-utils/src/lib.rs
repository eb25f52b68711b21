//! Shared test utilities for the test-machine workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`git`]: local Git remotes with chosen branches and tags
//! - [`vault`]: in-memory credential store, test ciphers and sample keys

pub mod git;
pub mod vault;
