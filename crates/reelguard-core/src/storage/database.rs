//! SQLite-backed usage ledger.
//!
//! Persists the daily counters and the limit in a single `kv` table, keyed
//! exactly as the preference store this replaces:
//! - `usage_count_<YYYY-MM-DD>` -> INTEGER
//! - `reel_limit` -> INTEGER
//!
//! Each increment runs in an `IMMEDIATE` transaction: the stored value is
//! read and validated under the write lock, then replaced by the new count.
//! Increments are never lost, and a corrupt value is reported without being
//! touched. File databases run in WAL mode, letting a reader on another
//! connection (see [`SqliteLedger::open_reader`]) see committed counts
//! without blocking the writer.

use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::{data_dir, migrations};
use crate::error::LedgerError;
use crate::ledger::{
    clamp_limit, validate_limit, DateKey, UsageLedger, DEFAULT_LIMIT, LIMIT_KEY,
};

const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

/// Usage ledger stored in SQLite.
pub struct SqliteLedger {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteLedger {
    /// Open the ledger at `<data dir>/reelguard.db`.
    ///
    /// # Errors
    /// Returns an error if the data directory or database cannot be opened
    /// or migrated.
    pub fn open_default() -> Result<Self, LedgerError> {
        let dir = data_dir().map_err(|e| LedgerError::QueryFailed(e.to_string()))?;
        Self::open(dir.join("reelguard.db"))
    }

    /// Open (or create) the ledger at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).map_err(|source| LedgerError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!(path = %path.display(), journal_mode = %mode, "opened usage ledger");
        migrations::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path),
        })
    }

    /// Open an in-memory ledger.
    pub fn open_memory() -> Result<Self, LedgerError> {
        let conn = Connection::open_in_memory()?;
        migrations::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Open a second connection to the same database file.
    ///
    /// In-process readers such as the status reporter should use this rather
    /// than sharing the writer's connection, so their reads never wait on the
    /// writer's lock.
    ///
    /// # Errors
    /// Returns an error for in-memory ledgers, which have no file to share,
    /// or if the file cannot be opened.
    pub fn open_reader(&self) -> Result<Self, LedgerError> {
        match &self.path {
            Some(path) => Self::open(path),
            None => Err(LedgerError::QueryFailed(
                "in-memory ledger cannot be opened twice".to_string(),
            )),
        }
    }

    /// Location on disk, `None` for in-memory ledgers.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, LedgerError> {
        self.conn.lock().map_err(|_| LedgerError::Poisoned)
    }

    fn read_int(conn: &Connection, key: &str) -> Result<Option<i64>, LedgerError> {
        let raw = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                Ok(int_value(row.get_ref(0)?))
            })
            .optional()?;

        match raw {
            None => Ok(None),
            Some(Ok(n)) => Ok(Some(n)),
            Some(Err(value)) => Err(LedgerError::Corrupt {
                key: key.to_string(),
                value,
            }),
        }
    }

    /// All recorded days with their counts, newest first.
    pub fn history(&self, limit: usize) -> Result<Vec<(DateKey, u32)>, LedgerError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT key, value FROM kv
             WHERE key LIKE 'usage\\_count\\_%' ESCAPE '\\'
             ORDER BY key DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((row.get::<_, String>(0)?, int_value(row.get_ref(1)?)))
        })?;

        let mut days = Vec::new();
        for row in rows {
            let (key, value) = row?;
            let Some(day) = key
                .strip_prefix(crate::ledger::USAGE_KEY_PREFIX)
                .and_then(DateKey::parse)
            else {
                continue;
            };
            match value
                .map_err(|value| LedgerError::Corrupt {
                    key: key.clone(),
                    value,
                })
                .and_then(|n| to_count(&key, n))
            {
                Ok(count) => days.push((day, count)),
                Err(e) => tracing::warn!("skipping history row: {e}"),
            }
        }
        Ok(days)
    }
}

/// Integer held in a `kv` value, or its textual form when it is not one.
fn int_value(value: ValueRef<'_>) -> Result<i64, String> {
    match value {
        ValueRef::Integer(n) => Ok(n),
        ValueRef::Text(t) => {
            let text = String::from_utf8_lossy(t).trim().to_string();
            text.parse::<i64>().map_err(|_| text)
        }
        ValueRef::Real(f) => Err(f.to_string()),
        ValueRef::Null => Err("NULL".to_string()),
        ValueRef::Blob(_) => Err("<blob>".to_string()),
    }
}

fn to_count(key: &str, value: i64) -> Result<u32, LedgerError> {
    u32::try_from(value).map_err(|_| LedgerError::Corrupt {
        key: key.to_string(),
        value: value.to_string(),
    })
}

impl UsageLedger for SqliteLedger {
    fn count(&self, day: &DateKey) -> Result<u32, LedgerError> {
        let key = day.storage_key();
        let conn = self.conn()?;
        match Self::read_int(&conn, &key)? {
            Some(n) => to_count(&key, n),
            None => Ok(0),
        }
    }

    fn increment(&self, day: &DateKey) -> Result<u32, LedgerError> {
        let key = day.storage_key();
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = match Self::read_int(&tx, &key)? {
            Some(n) => to_count(&key, n)?,
            None => 0,
        };
        let next = current.checked_add(1).ok_or_else(|| LedgerError::Corrupt {
            key: key.clone(),
            value: current.to_string(),
        })?;
        tx.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, next],
        )?;
        tx.commit()?;
        Ok(next)
    }

    fn limit(&self) -> Result<u32, LedgerError> {
        let conn = self.conn()?;
        Ok(Self::read_int(&conn, LIMIT_KEY)?
            .map(clamp_limit)
            .unwrap_or(DEFAULT_LIMIT))
    }

    fn set_limit(&self, limit: u32) -> Result<u32, LedgerError> {
        let limit = validate_limit(limit)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![LIMIT_KEY, limit],
        )?;
        Ok(limit)
    }

    fn reset(&self, day: &DateKey) -> Result<(), LedgerError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, 0)",
            params![day.storage_key()],
        )?;
        Ok(())
    }
}
