//! Per-repository mutual exclusion for syncs

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Keyed mutexes, one per repository id currently being synced.
///
/// Syncs of the same repository run one after another; syncs of different
/// repositories never wait on each other. Entries are dropped once no
/// caller holds or waits for them.
#[derive(Debug, Default)]
pub struct RepositoryLocks {
    locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl RepositoryLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `repository_id`.
    pub fn with_lock<T>(&self, repository_id: i64, f: impl FnOnce() -> T) -> T {
        let entry = self.entry(repository_id);
        let result = {
            let _guard = entry.lock().unwrap_or_else(|e| e.into_inner());
            f()
        };
        self.release(repository_id, &entry);
        result
    }

    /// Number of repositories with a live lock entry.
    pub fn active(&self) -> usize {
        self.map().len()
    }

    fn entry(&self, repository_id: i64) -> Arc<Mutex<()>> {
        self.map().entry(repository_id).or_default().clone()
    }

    fn release(&self, repository_id: i64, entry: &Arc<Mutex<()>>) {
        let mut map = self.map();
        // One reference in the map, one held by this caller.
        if Arc::strong_count(entry) == 2 {
            map.remove(&repository_id);
        }
    }

    fn map(&self) -> MutexGuard<'_, HashMap<i64, Arc<Mutex<()>>>> {
        self.locks.lock().unwrap_or_else(|e| e.into_inner())
    }
}
