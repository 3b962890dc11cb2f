//! Key-value byte store contract and SQLite implementation.
//!
//! # Responsibility
//! - Store opaque byte values under short string keys.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Keys are trimmed and must not be blank.
//! - `save` is an upsert; the latest write replaces the previous value.

use crate::db::{open_db, open_db_in_memory, DbError};
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub type RepoResult<T> = Result<T, RepoError>;

/// Store errors.
#[derive(Debug)]
pub enum RepoError {
    /// Key is blank after trim.
    InvalidKey(String),
    Db(DbError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidKey(key) => write!(f, "store key must not be blank: `{key}`"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidKey(_) => None,
            Self::Db(err) => Some(err),
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Byte store keyed by a process-constant identifier.
pub trait KvStore {
    /// Returns the stored bytes, or `None` when the key was never saved.
    fn load(&self, key: &str) -> RepoResult<Option<Vec<u8>>>;
    /// Stores `value` under `key`, replacing any previous value.
    fn save(&self, key: &str, value: &[u8]) -> RepoResult<()>;
}

/// SQLite-backed key-value store over the `kv_entries` table.
pub struct SqliteKvStore {
    conn: Connection,
}

impl SqliteKvStore {
    /// Wraps a connection that already has migrations applied.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens (or creates) a store file.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    /// Opens a throwaway in-memory store.
    pub fn open_in_memory() -> RepoResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl KvStore for SqliteKvStore {
    fn load(&self, key: &str) -> RepoResult<Option<Vec<u8>>> {
        let key = normalize_key(key)?;
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                params![key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn save(&self, key: &str, value: &[u8]) -> RepoResult<()> {
        let key = normalize_key(key)?;
        self.conn.execute(
            "INSERT INTO kv_entries (key, value)
             VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        Ok(())
    }
}

fn normalize_key(key: &str) -> RepoResult<&str> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return Err(RepoError::InvalidKey(key.to_string()));
    }
    Ok(trimmed)
}
