//! Classification of advertised refs into branch and tag snapshots

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tm_git::RemoteRef;
use tm_store::{BranchRecord, RefReplacement, TagRecord};

const BRANCH_PREFIX: &str = "refs/heads/";
const TAG_PREFIX: &str = "refs/tags/";
const PEELED_SUFFIX: &str = "^{}";

/// Branch names tried, in order, when picking the default branch.
pub const DEFAULT_BRANCH_CANDIDATES: [&str; 2] = ["main", "master"];

/// Branches and tags of one remote, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RefSnapshot {
    pub branches: Vec<BranchRecord>,
    pub tags: Vec<TagRecord>,
    pub default_branch: Option<String>,
}

impl RefSnapshot {
    pub fn into_replacement(self, synced_at: DateTime<Utc>) -> RefReplacement {
        RefReplacement {
            branches: self.branches,
            tags: self.tags,
            default_branch: self.default_branch,
            synced_at,
        }
    }
}

/// Split advertised refs into branches and tags.
///
/// `refs/heads/*` become branches and `refs/tags/*` become tags. For an
/// annotated tag the peeled `refs/tags/<name>^{}` entry supplies the commit
/// hash. Everything else (`HEAD`, `refs/pull/*`, ...) is ignored. Output is
/// sorted by name; only the selected default branch is flagged.
pub fn classify_refs(refs: &[RemoteRef]) -> RefSnapshot {
    let mut branches = BTreeMap::new();
    let mut tags = BTreeMap::new();
    let mut peeled = BTreeMap::new();

    for remote_ref in refs {
        if let Some(name) = remote_ref.name.strip_prefix(BRANCH_PREFIX) {
            if !name.is_empty() {
                branches.insert(name, remote_ref.target.as_str());
            }
        } else if let Some(name) = remote_ref.name.strip_prefix(TAG_PREFIX) {
            match name.strip_suffix(PEELED_SUFFIX) {
                Some(tag) if !tag.is_empty() => {
                    peeled.insert(tag, remote_ref.target.as_str());
                }
                Some(_) => {}
                None if !name.is_empty() => {
                    tags.insert(name, remote_ref.target.as_str());
                }
                None => {}
            }
        } else {
            tracing::trace!(name = %remote_ref.name, "Ignoring ref");
        }
    }

    for (name, commit) in peeled {
        tags.insert(name, commit);
    }

    let default_branch = select_default_branch(branches.keys().copied());
    tracing::debug!(
        branch_count = branches.len(),
        tag_count = tags.len(),
        default_branch = default_branch.as_deref().unwrap_or("<none>"),
        "Classified remote refs"
    );

    RefSnapshot {
        branches: branches
            .into_iter()
            .map(|(name, commit)| BranchRecord {
                name: name.to_string(),
                commit_hash: non_empty(commit),
                is_default: default_branch.as_deref() == Some(name),
            })
            .collect(),
        tags: tags
            .into_iter()
            .map(|(name, commit)| TagRecord {
                name: name.to_string(),
                commit_hash: non_empty(commit),
            })
            .collect(),
        default_branch,
    }
}

/// `main` if present, else `master`, else nothing.
pub fn select_default_branch<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let names: Vec<&str> = names.into_iter().collect();
    DEFAULT_BRANCH_CANDIDATES
        .into_iter()
        .find(|candidate| names.contains(candidate))
        .map(|candidate| candidate.to_string())
}

fn non_empty(hash: &str) -> Option<String> {
    (!hash.is_empty()).then(|| hash.to_string())
}
