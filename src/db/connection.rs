use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::error::{StoreContext, TrackerResult};

/// How long a connection waits on a lock held by another process before
/// giving up with `SQLITE_BUSY`.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the single-file SQLite store. Only the path is kept: every
/// operation opens its own connection and drops it when done, so no
/// transaction outlives the call that started it.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the data directory and the schema if they are missing.
    /// Returns `true` when the database file did not exist beforehand.
    /// Safe to call on every start-up.
    pub fn initialize(&self) -> TrackerResult<bool> {
        let created = !self.path.exists();
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = self.connect()?;
        ensure_schema(&conn)?;

        if created {
            log::info!("created rework database at {}", self.path.display());
        } else {
            log::debug!("opened existing rework database at {}", self.path.display());
        }
        Ok(created)
    }

    /// Open a fresh connection with the busy timeout applied.
    pub fn connect(&self) -> TrackerResult<Connection> {
        let conn = Connection::open(&self.path).store_context("failed to open SQLite database")?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .store_context("failed to set busy timeout")?;
        Ok(conn)
    }

    /// Run a read-only unit of work on its own connection.
    pub fn read<T>(&self, work: impl FnOnce(&Connection) -> TrackerResult<T>) -> TrackerResult<T> {
        let conn = self.connect()?;
        work(&conn)
    }

    /// Run `work` inside an `IMMEDIATE` transaction. The write lock is taken
    /// up front so read-then-write sequences cannot interleave with another
    /// writer. Commits on `Ok`; dropping the transaction on `Err` rolls back.
    pub fn write<T>(
        &self,
        work: impl FnOnce(&Transaction<'_>) -> TrackerResult<T>,
    ) -> TrackerResult<T> {
        let mut conn = self.connect()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .store_context("failed to begin transaction")?;
        let value = work(&tx)?;
        tx.commit().store_context("failed to commit transaction")?;
        Ok(value)
    }
}

/// Create all four tables. Uniqueness of `entries.pcb_id` and of
/// `(pcb_id, rework_no)` is enforced here rather than trusted to callers.
pub(crate) fn ensure_schema(conn: &Connection) -> TrackerResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS models (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            model_name TEXT NOT NULL UNIQUE
        )",
        [],
    )
    .store_context("failed to create models table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS operators (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL
        )",
        [],
    )
    .store_context("failed to create operators table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS entries (
            sr_no INTEGER PRIMARY KEY AUTOINCREMENT,
            pcb_id TEXT NOT NULL UNIQUE,
            model TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            rejection_stage TEXT NOT NULL,
            rejection_details TEXT NOT NULL
        )",
        [],
    )
    .store_context("failed to create entries table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS rework_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            pcb_id TEXT NOT NULL,
            rework_no INTEGER NOT NULL,
            rework_action TEXT NOT NULL,
            rework_date TEXT NOT NULL,
            rework_done_by TEXT NOT NULL,
            UNIQUE (pcb_id, rework_no)
        )",
        [],
    )
    .store_context("failed to create rework_log table")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::error::TrackerError;

    #[test]
    fn initialize_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("nested").join("rework_data.db"));

        assert!(store.initialize().unwrap());
        assert!(!store.initialize().unwrap());

        let tables: i64 = store
            .read(|conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                     AND name IN ('models', 'operators', 'entries', 'rework_log')",
                    [],
                    |row| row.get(0),
                )
                .store_context("count tables")
            })
            .unwrap();
        assert_eq!(tables, 4);
    }

    #[test]
    fn failed_write_rolls_back() {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("rework_data.db"));
        store.initialize().unwrap();

        let result: TrackerResult<()> = store.write(|tx| {
            tx.execute("INSERT INTO models (model_name) VALUES ('ModelX')", [])
                .store_context("insert model")?;
            Err(TrackerError::Validation("Model name"))
        });
        assert!(result.is_err());

        let count: i64 = store
            .read(|conn| {
                conn.query_row("SELECT COUNT(*) FROM models", [], |row| row.get(0))
                    .store_context("count models")
            })
            .unwrap();
        assert_eq!(count, 0);
    }
}
