//! Specialized-store collaborator: fetching and reading SQLite databases.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use crate::error::{StoreError, StoreResult};

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// Resolves a database location to a local file that can be opened.
///
/// Remote backends download into a local cache and return the cached path.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, location: &str) -> StoreResult<PathBuf>;
}

/// [`Fetcher`] for plain paths and `file://` URLs.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFetcher;

impl Fetcher for LocalFetcher {
    fn fetch(&self, location: &str) -> StoreResult<PathBuf> {
        let path = match location.strip_prefix("file://") {
            Some(path) => PathBuf::from(path),
            None => {
                if let Some((scheme, _)) = location.split_once("://") {
                    return Err(StoreError::UnsupportedScheme {
                        scheme: scheme.to_string(),
                        location: location.to_string(),
                    });
                }
                PathBuf::from(location)
            }
        };

        let meta = std::fs::metadata(&path).map_err(|e| StoreError::ResourceUnavailable {
            location: location.to_string(),
            reason: e.to_string(),
        })?;
        if !meta.is_file() {
            return Err(StoreError::ResourceUnavailable {
                location: location.to_string(),
                reason: "not a regular file".into(),
            });
        }
        Ok(path)
    }
}

// ---------------------------------------------------------------------------
// SqliteDatabase
// ---------------------------------------------------------------------------

/// A read-only connection to one SQLite database file.
///
/// Connections are task-local: every evaluator opens its own.
pub struct SqliteDatabase {
    conn: Connection,
    location: String,
}

impl std::fmt::Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDatabase")
            .field("location", &self.location)
            .finish()
    }
}

impl SqliteDatabase {
    /// Open `path` read-only and check that it really is a database.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let location = path.display().to_string();
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)
            .map_err(|e| StoreError::from_sqlite(&location, e))?;

        // SQLite reads the header lazily; force it so a bad file fails here.
        conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))
            .map_err(|e| StoreError::from_sqlite(&location, e))?;

        debug!(%location, "opened sqlite database");
        Ok(Self { conn, location })
    }

    /// Names of the user tables (SQLite internals excluded).
    pub fn tables(&self) -> StoreResult<BTreeSet<String>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\'",
            )
            .map_err(|e| self.err(e))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| self.err(e))?
            .collect::<Result<BTreeSet<_>, _>>()
            .map_err(|e| self.err(e))?;
        Ok(names)
    }

    /// Column name mapped to declared type for `table`.
    pub fn columns(&self, table: &str) -> StoreResult<BTreeMap<String, String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, type FROM pragma_table_info(?1)")
            .map_err(|e| self.err(e))?;
        let columns = stmt
            .query_map([table], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(|e| self.err(e))?
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map_err(|e| self.err(e))?;
        Ok(columns)
    }

    /// Number of rows in `table`.
    pub fn row_count(&self, table: &str) -> StoreResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
        let count: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(|e| self.err(e))?;
        Ok(count.max(0) as u64)
    }

    fn err(&self, e: rusqlite::Error) -> StoreError {
        StoreError::from_sqlite(&self.location, e)
    }
}

/// SQL identifier literal for `name`.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
