//! Credential rows in the SQLite store
//!
//! The `ciphertext` column is read by exactly one query, behind
//! [`CredentialStore::sealed_secret`].

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tm_vault::{
    Credential, CredentialChanges, CredentialDraft, CredentialKind, CredentialStore, SealedSecret,
};

use crate::sqlite::SqliteStore;
use crate::{Error, Result};

const CREDENTIAL_COLUMNS: &str =
    "id, name, description, kind, username, created_at, updated_at";

/// Credential row before its kind string has been checked.
struct CredentialRow {
    id: i64,
    name: String,
    description: Option<String>,
    kind: String,
    username: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CredentialRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            kind: row.get(3)?,
            username: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    fn into_credential(self) -> tm_vault::Result<Credential> {
        Ok(Credential {
            id: self.id,
            name: self.name,
            description: self.description,
            kind: self.kind.parse::<CredentialKind>()?,
            username: self.username,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn load_credential(conn: &Connection, id: i64) -> Result<Option<CredentialRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {CREDENTIAL_COLUMNS} FROM credentials WHERE id = ?1"),
            [id],
            CredentialRow::from_row,
        )
        .optional()?;
    Ok(row)
}

fn load_all_credentials(conn: &Connection) -> Result<Vec<CredentialRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CREDENTIAL_COLUMNS} FROM credentials ORDER BY created_at DESC, id DESC"
    ))?;
    let rows = stmt
        .query_map([], CredentialRow::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

impl CredentialStore for SqliteStore {
    fn insert_credential(
        &self,
        draft: &CredentialDraft,
        secret: &SealedSecret,
    ) -> tm_vault::Result<Credential> {
        let conn = self.conn();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO credentials (name, description, kind, username, ciphertext, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                draft.name,
                draft.description,
                draft.kind.as_str(),
                draft.username,
                secret.as_str(),
                now
            ],
        )
        .map_err(Error::from)?;
        let id = conn.last_insert_rowid();

        load_credential(&conn, id)?
            .ok_or(Error::not_found("credential", id))?
            .into_credential()
    }

    fn update_credential(
        &self,
        id: i64,
        changes: &CredentialChanges,
        secret: Option<&SealedSecret>,
    ) -> tm_vault::Result<Option<Credential>> {
        let conn = self.conn();
        let now = Utc::now();
        let changed = match secret {
            Some(secret) => conn.execute(
                "UPDATE credentials SET name = ?1, description = ?2, username = ?3, ciphertext = ?4, updated_at = ?5
                 WHERE id = ?6",
                params![changes.name, changes.description, changes.username, secret.as_str(), now, id],
            ),
            None => conn.execute(
                "UPDATE credentials SET name = ?1, description = ?2, username = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![changes.name, changes.description, changes.username, now, id],
            ),
        }
        .map_err(Error::from)?;

        if changed == 0 {
            return Ok(None);
        }
        load_credential(&conn, id)?
            .map(CredentialRow::into_credential)
            .transpose()
    }

    fn get_credential(&self, id: i64) -> tm_vault::Result<Option<Credential>> {
        load_credential(&self.conn(), id)?
            .map(CredentialRow::into_credential)
            .transpose()
    }

    fn list_credentials(&self) -> tm_vault::Result<Vec<Credential>> {
        load_all_credentials(&self.conn())?
            .into_iter()
            .map(CredentialRow::into_credential)
            .collect()
    }

    fn sealed_secret(&self, id: i64) -> tm_vault::Result<Option<SealedSecret>> {
        let blob: Option<String> = self
            .conn()
            .query_row(
                "SELECT ciphertext FROM credentials WHERE id = ?1",
                [id],
                |row| row.get(0),
            )
            .optional()
            .map_err(Error::from)?;
        Ok(blob.map(SealedSecret::from_stored))
    }

    fn delete_credential(&self, id: i64) -> tm_vault::Result<bool> {
        let deleted = self
            .conn()
            .execute("DELETE FROM credentials WHERE id = ?1", [id])
            .map_err(Error::from)?;
        Ok(deleted > 0)
    }
}

impl SqliteStore {
    /// Insert a credential row as-is, without the vault's validation.
    ///
    /// For importing rows written by other tools; new credentials should go
    /// through [`tm_vault::CredentialVault::create`].
    pub fn import_credential(
        &self,
        name: &str,
        kind: &str,
        username: Option<&str>,
        secret: &SealedSecret,
    ) -> Result<i64> {
        let conn = self.conn();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO credentials (name, description, kind, username, ciphertext, created_at, updated_at)
             VALUES (?1, NULL, ?2, ?3, ?4, ?5, ?5)",
            params![name, kind, username, secret.as_str(), now],
        )?;
        Ok(conn.last_insert_rowid())
    }
}
