//! SQLite search index (`docSet.dsidx`).
//!
//! Schema:
//! - searchIndex: id, name, type, path
//! - anchor: unique index over (name, type, path)
//!
//! Inserts never overwrite: a row whose triple already exists is dropped.

use std::fmt;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use rusqlite::{Connection, ErrorCode, params};
use thiserror::Error;
use tracing::{debug, warn};

use crate::layout::LayoutError;

const SCHEMA: &str = r"
CREATE TABLE searchIndex(id INTEGER PRIMARY KEY, name TEXT, type TEXT, path TEXT);
CREATE UNIQUE INDEX anchor ON searchIndex (name, type, path);
";

/// How long a connection waits on a locked database before giving up.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(120);

/// Pause before the single commit retry.
pub const DEFAULT_COMMIT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Category of a search entry, stored in the `type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryType {
    Class,
    Struct,
    Namespace,
    Type,
    Method,
    Function,
    Sample,
    File,
    Module,
    Union,
}

impl EntryType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::Class => "Class",
            EntryType::Struct => "Struct",
            EntryType::Namespace => "Namespace",
            EntryType::Type => "Type",
            EntryType::Method => "Method",
            EntryType::Function => "Function",
            EntryType::Sample => "Sample",
            EntryType::File => "File",
            EntryType::Module => "Module",
            EntryType::Union => "Union",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of `searchIndex`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEntry {
    pub name: String,
    pub entry_type: EntryType,
    pub path: String,
}

impl SearchEntry {
    pub fn new(name: impl Into<String>, entry_type: EntryType, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entry_type,
            path: path.into(),
        }
    }
}

/// Errors from building the index.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to list {}: {source}", .path.display())]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Connection to a docset search index.
pub struct SearchIndex {
    conn: Connection,
}

impl SearchIndex {
    /// Open (creating if needed) the index file at `path`.
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self, IndexError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        Ok(Self { conn })
    }

    /// In-memory index (for testing).
    pub fn in_memory() -> Result<Self, IndexError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Drop `searchIndex` if present and recreate it empty.
    pub fn reset(&self) -> Result<(), IndexError> {
        debug!("cleaning search index");
        if let Err(e) = self.conn.execute_batch("DROP TABLE searchIndex;") {
            warn!(error = %e, "failed to drop searchIndex, assuming this is a new database");
        }
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Insert `entry`, returning `false` when an identical row already exists.
    pub fn insert(&self, entry: &SearchEntry) -> Result<bool, IndexError> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO searchIndex(name, type, path) VALUES (?1, ?2, ?3)",
            params![entry.name, entry.entry_type.as_str(), entry.path],
        )?;
        Ok(changed > 0)
    }

    pub fn begin(&self) -> Result<(), IndexError> {
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    /// Commit the open transaction.
    ///
    /// If the database is locked, waits `retry_delay` and tries exactly once
    /// more; the second attempt's result is returned as is.
    pub fn commit_with_retry(&self, retry_delay: Duration) -> Result<(), IndexError> {
        match self.conn.execute_batch("COMMIT") {
            Err(e) if is_lock_error(&e) => {
                warn!(
                    delay_ms = retry_delay.as_millis() as u64,
                    "database locked, retrying commit"
                );
                thread::sleep(retry_delay);
                self.conn.execute_batch("COMMIT")?;
                Ok(())
            }
            other => Ok(other?),
        }
    }

    /// All rows ordered by id.
    pub fn entries(&self) -> Result<Vec<SearchEntry>, IndexError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, type, path FROM searchIndex ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (name, kind, path) = row?;
            if let Some(entry_type) = parse_entry_type(&kind) {
                entries.push(SearchEntry::new(name, entry_type, path));
            }
        }
        Ok(entries)
    }

    pub fn count(&self) -> Result<usize, IndexError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM searchIndex", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

fn parse_entry_type(s: &str) -> Option<EntryType> {
    Some(match s {
        "Class" => EntryType::Class,
        "Struct" => EntryType::Struct,
        "Namespace" => EntryType::Namespace,
        "Type" => EntryType::Type,
        "Method" => EntryType::Method,
        "Function" => EntryType::Function,
        "Sample" => EntryType::Sample,
        "File" => EntryType::File,
        "Module" => EntryType::Module,
        "Union" => EntryType::Union,
        _ => return None,
    })
}

fn is_lock_error(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if matches!(err.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}
