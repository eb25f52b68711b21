//! Table layout for the SQLite store

use rusqlite::Connection;

use crate::Result;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS credentials (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT,
    kind TEXT NOT NULL,
    username TEXT,
    ciphertext TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS repositories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT,
    remote_url TEXT NOT NULL,
    credential_id INTEGER REFERENCES credentials(id) ON DELETE RESTRICT,
    default_branch TEXT,
    synced_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TRIGGER IF NOT EXISTS repositories_remote_url_immutable
BEFORE UPDATE OF remote_url ON repositories
WHEN NEW.remote_url IS NOT OLD.remote_url
BEGIN
    SELECT RAISE(ABORT, 'remote_url is immutable');
END;

CREATE TABLE IF NOT EXISTS branches (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    repository_id INTEGER NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    commit_hash TEXT,
    is_default INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    UNIQUE (repository_id, name)
);

CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    repository_id INTEGER NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    commit_hash TEXT,
    created_at TEXT NOT NULL,
    UNIQUE (repository_id, name)
);

CREATE INDEX IF NOT EXISTS repositories_credential_id ON repositories(credential_id);
";

/// Create any missing tables. Idempotent.
pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
