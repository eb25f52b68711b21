//! SQLite implementation of the repository store
//!
//! One connection guarded by a mutex. Snapshot replaces run in an
//! `IMMEDIATE` transaction so the write lock is taken before the first delete
//! and readers on other connections see either the old or the new snapshot.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};

use crate::model::{
    Branch, NewRepository, RefReplacement, Repository, RepositoryUpdate, Tag,
};
use crate::store::RepositoryStore;
use crate::{Error, Result, schema};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const REPOSITORY_COLUMNS: &str = "id, name, description, remote_url, credential_id, \
     default_branch, synced_at, created_at, updated_at";

/// SQLite-backed store for repositories, ref snapshots and credentials.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (creating if needed) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "Opened SQLite store");
        Self::from_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        schema::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock cannot leave a transaction open:
        // rusqlite rolls back on drop.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a repository.
    pub fn create_repository(&self, new: &NewRepository) -> Result<Repository> {
        let name = new.name.trim();
        let remote_url = new.remote_url.trim();
        if name.is_empty() {
            return Err(Error::validation("repository name is required"));
        }
        if remote_url.is_empty() {
            return Err(Error::validation("remote URL is required"));
        }

        let conn = self.conn();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO repositories (name, description, remote_url, credential_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![name, new.description, remote_url, new.credential_id, now],
        )?;
        let id = conn.last_insert_rowid();

        load_repository(&conn, id)?.ok_or(Error::not_found("repository", id))
    }

    /// Change name, description or credential. The remote URL cannot change.
    pub fn update_repository(&self, id: i64, update: &RepositoryUpdate) -> Result<Repository> {
        let name = update.name.trim();
        if name.is_empty() {
            return Err(Error::validation("repository name is required"));
        }

        let conn = self.conn();
        let changed = conn.execute(
            "UPDATE repositories SET name = ?1, description = ?2, credential_id = ?3, updated_at = ?4
             WHERE id = ?5",
            params![name, update.description, update.credential_id, Utc::now(), id],
        )?;
        if changed == 0 {
            return Err(Error::not_found("repository", id));
        }

        load_repository(&conn, id)?.ok_or(Error::not_found("repository", id))
    }

    /// All repositories, newest first, without refs.
    pub fn list_repositories(&self) -> Result<Vec<Repository>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {REPOSITORY_COLUMNS} FROM repositories ORDER BY created_at DESC, id DESC"
        ))?;
        let repositories = stmt
            .query_map([], repository_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(repositories)
    }

    /// Delete a repository; its branches and tags go with it.
    pub fn delete_repository(&self, id: i64) -> Result<()> {
        let conn = self.conn();
        let deleted = conn.execute("DELETE FROM repositories WHERE id = ?1", [id])?;
        if deleted == 0 {
            return Err(Error::not_found("repository", id));
        }
        Ok(())
    }

    /// Ids of repositories that reference a credential.
    ///
    /// Callers check this before deleting a credential.
    pub fn repositories_using_credential(&self, credential_id: i64) -> Result<Vec<i64>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT id FROM repositories WHERE credential_id = ?1 ORDER BY id")?;
        let ids = stmt
            .query_map([credential_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(ids)
    }

    /// Branches of a repository, default first, then by name.
    pub fn branches(&self, repository_id: i64) -> Result<Vec<Branch>> {
        load_branches(&self.conn(), repository_id)
    }

    /// Tags of a repository, by name descending.
    pub fn tags(&self, repository_id: i64) -> Result<Vec<Tag>> {
        load_tags(&self.conn(), repository_id)
    }
}

impl RepositoryStore for SqliteStore {
    fn get_repository(&self, id: i64) -> Result<Option<Repository>> {
        load_repository(&self.conn(), id)
    }

    fn get_repository_with_refs(&self, id: i64) -> Result<Option<Repository>> {
        load_repository_with_refs(&self.conn(), id)
    }

    fn replace_branches_and_tags(
        &self,
        id: i64,
        replacement: &RefReplacement,
    ) -> Result<Repository> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let updated = tx.execute(
            "UPDATE repositories SET default_branch = ?1, synced_at = ?2, updated_at = ?2
             WHERE id = ?3",
            params![replacement.default_branch, replacement.synced_at, id],
        )?;
        if updated == 0 {
            return Err(Error::not_found("repository", id));
        }

        tx.execute("DELETE FROM branches WHERE repository_id = ?1", [id])?;
        tx.execute("DELETE FROM tags WHERE repository_id = ?1", [id])?;

        {
            let mut insert_branch = tx.prepare(
                "INSERT INTO branches (repository_id, name, commit_hash, is_default, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for branch in &replacement.branches {
                insert_branch
                    .execute(params![
                        id,
                        branch.name,
                        branch.commit_hash,
                        branch.is_default,
                        replacement.synced_at
                    ])
                    .map_err(|e| insert_failed("branch", &branch.name, e))?;
            }

            let mut insert_tag = tx.prepare(
                "INSERT INTO tags (repository_id, name, commit_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for tag in &replacement.tags {
                insert_tag
                    .execute(params![id, tag.name, tag.commit_hash, replacement.synced_at])
                    .map_err(|e| insert_failed("tag", &tag.name, e))?;
            }
        }

        tx.commit()?;
        tracing::debug!(
            repository_id = id,
            branch_count = replacement.branches.len(),
            tag_count = replacement.tags.len(),
            "Committed ref snapshot"
        );

        load_repository_with_refs(&conn, id)?.ok_or(Error::not_found("repository", id))
    }
}

fn insert_failed(kind: &str, name: &str, err: rusqlite::Error) -> Error {
    match Error::from(err) {
        Error::Constraint { message } => Error::Constraint {
            message: format!("failed to insert {kind} '{name}': {message}"),
        },
        other => other,
    }
}

fn repository_from_row(row: &Row<'_>) -> rusqlite::Result<Repository> {
    Ok(Repository {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        remote_url: row.get(3)?,
        credential_id: row.get(4)?,
        default_branch: row.get(5)?,
        synced_at: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
        branches: Vec::new(),
        tags: Vec::new(),
    })
}

fn load_repository(conn: &Connection, id: i64) -> Result<Option<Repository>> {
    let repository = conn
        .query_row(
            &format!("SELECT {REPOSITORY_COLUMNS} FROM repositories WHERE id = ?1"),
            [id],
            repository_from_row,
        )
        .optional()?;
    Ok(repository)
}

fn load_repository_with_refs(conn: &Connection, id: i64) -> Result<Option<Repository>> {
    let Some(mut repository) = load_repository(conn, id)? else {
        return Ok(None);
    };
    repository.branches = load_branches(conn, id)?;
    repository.tags = load_tags(conn, id)?;
    Ok(Some(repository))
}

fn load_branches(conn: &Connection, repository_id: i64) -> Result<Vec<Branch>> {
    let mut stmt = conn.prepare(
        "SELECT id, repository_id, name, commit_hash, is_default, created_at
         FROM branches WHERE repository_id = ?1 ORDER BY is_default DESC, name",
    )?;
    let branches = stmt
        .query_map([repository_id], |row| {
            Ok(Branch {
                id: row.get(0)?,
                repository_id: row.get(1)?,
                name: row.get(2)?,
                commit_hash: row.get(3)?,
                is_default: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(branches)
}

fn load_tags(conn: &Connection, repository_id: i64) -> Result<Vec<Tag>> {
    let mut stmt = conn.prepare(
        "SELECT id, repository_id, name, commit_hash, created_at
         FROM tags WHERE repository_id = ?1 ORDER BY name DESC",
    )?;
    let tags = stmt
        .query_map([repository_id], |row| {
            Ok(Tag {
                id: row.get(0)?,
                repository_id: row.get(1)?,
                name: row.get(2)?,
                commit_hash: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tags)
}
