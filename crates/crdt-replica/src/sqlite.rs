//! SQLite backend using rusqlite.
//!
//! Each object is one row keyed by bucket, kind tag and name, so the
//! objects of one kind can be queried without decoding anything. The
//! connection runs in WAL mode.
//!
//! # Example
//!
//! ```no_run
//! use crdt_client::{CrdtKind, TypedKey};
//! use crdt_replica::{SqliteStore, StateStore};
//!
//! let tags = TypedKey::new("tags", CrdtKind::Set).unwrap();
//! let mut store = SqliteStore::open("replica.db").unwrap();
//! store.save_batch("default", &[(&tags, b"\xCF\x01\x03".as_slice())]).unwrap();
//!
//! assert_eq!(store.load("default", &tags).unwrap().unwrap(), b"\xCF\x01\x03");
//! ```

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crdt_client::{CrdtKind, TypedKey};
use rusqlite::{params, Connection, OptionalExtension};

use crate::traits::StateStore;

/// Error type for the SQLite backend.
#[derive(Debug)]
pub enum SqliteError {
    /// An error from rusqlite.
    Sqlite(rusqlite::Error),
    /// A row whose kind tag or name is not a valid key.
    InvalidRow(String),
    /// Lock poisoned.
    LockPoisoned,
}

impl std::fmt::Display for SqliteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(e) => write!(f, "sqlite error: {e}"),
            Self::InvalidRow(msg) => write!(f, "invalid object row: {msg}"),
            Self::LockPoisoned => write!(f, "sqlite lock poisoned"),
        }
    }
}

impl std::error::Error for SqliteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sqlite(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for SqliteError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Sqlite(e)
    }
}

/// SQLite-backed [`StateStore`].
///
/// Wraps a `rusqlite::Connection` behind a `Mutex`. The schema is created on
/// first open.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS crdt_objects (
    bucket  TEXT    NOT NULL,
    kind    INTEGER NOT NULL,
    name    TEXT    NOT NULL,
    state   BLOB    NOT NULL,
    PRIMARY KEY (bucket, kind, name)
);";

const UPSERT: &str = "INSERT INTO crdt_objects (bucket, kind, name, state)
     VALUES (?1, ?2, ?3, ?4)
     ON CONFLICT(bucket, kind, name) DO UPDATE SET state = excluded.state";

impl SqliteStore {
    /// Open (or create) a database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SqliteError> {
        Self::init(Connection::open(path)?)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, SqliteError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, SqliteError> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA synchronous = NORMAL;",
        )?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteError> {
        self.conn.lock().map_err(|_| SqliteError::LockPoisoned)
    }
}

fn row_key(tag: i64, name: String) -> Result<TypedKey, SqliteError> {
    let kind = u8::try_from(tag)
        .ok()
        .and_then(CrdtKind::from_tag)
        .ok_or_else(|| SqliteError::InvalidRow(format!("unknown kind tag {tag}")))?;
    TypedKey::new(name, kind).map_err(|e| SqliteError::InvalidRow(e.to_string()))
}

impl StateStore for SqliteStore {
    type Error = SqliteError;

    fn keys(&self, bucket: &str) -> Result<Vec<TypedKey>, Self::Error> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT kind, name FROM crdt_objects WHERE bucket = ?1 ORDER BY kind, name")?;
        let rows = stmt
            .query_map(params![bucket], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(|(tag, name)| row_key(tag, name)).collect()
    }

    fn load(&self, bucket: &str, key: &TypedKey) -> Result<Option<Vec<u8>>, Self::Error> {
        let conn = self.lock()?;
        let state = conn
            .query_row(
                "SELECT state FROM crdt_objects WHERE bucket = ?1 AND kind = ?2 AND name = ?3",
                params![bucket, key.kind().tag(), key.name()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(state)
    }

    fn save_batch(
        &mut self,
        bucket: &str,
        objects: &[(&TypedKey, &[u8])],
    ) -> Result<(), Self::Error> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(UPSERT)?;
            for (key, state) in objects {
                stmt.execute(params![bucket, key.kind().tag(), key.name(), state])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
