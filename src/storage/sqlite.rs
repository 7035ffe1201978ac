//! SQLite storage implementation

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use rusqlite::{Connection, params, OptionalExtension};
use serde::Serialize;
use crate::{Result, Error};
use crate::record::{self, Record};
use super::schema;

const RECORD_COLUMNS: &str = "identifier, label, last_modified";

/// SQLite-backed storage for labelling records.
///
/// The connection sits behind a mutex so one store can be shared as
/// `Arc<RecordStore>` by every request handler. Each write commits before
/// returning.
#[derive(Debug)]
pub struct RecordStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl RecordStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| Error::StorageUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        conn.busy_timeout(Duration::from_millis(schema::BUSY_TIMEOUT_MS))?;
        let store = Self { conn: Mutex::new(conn), path: Some(path.to_path_buf()) };
        store.initialize_schema()?;
        tracing::info!("Opened record store at {}", path.display());
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn: Mutex::new(conn), path: None };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.lock();
        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, [])?;
        }
        Ok(())
    }

    /// Database file backing this store, `None` when in memory
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // A panic mid-statement cannot leave a half-applied write behind:
    // every write is a single statement or a transaction.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ========== Write Operations ==========

    /// Insert every identifier that is not stored yet.
    ///
    /// Identifiers already present (in storage or earlier in the same batch)
    /// are skipped and their labels left alone; that is not an error. Blank
    /// identifiers are ignored. The whole batch commits as one transaction;
    /// an identifier containing a tab or line break rejects the batch.
    pub fn import_batch<I, S>(&self, identifiers: I) -> Result<ImportReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let identifiers: Vec<S> = identifiers.into_iter().collect();
        for identifier in &identifiers {
            record::validate_identifier(identifier.as_ref())?;
        }

        let mut report = ImportReport::default();
        let created = record::format_timestamp(&record::now());

        let mut conn = self.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO records (identifier, label, last_modified)
                VALUES (?1, NULL, ?2)
                ON CONFLICT(identifier) DO NOTHING
                "#,
            )?;

            for identifier in identifiers {
                let identifier = identifier.as_ref();
                if identifier.trim().is_empty() {
                    continue;
                }
                report.attempted += 1;
                report.inserted += stmt.execute(params![identifier, created])?;
            }
        }
        tx.commit()?;

        tracing::debug!(
            "Imported batch: {} attempted, {} inserted",
            report.attempted,
            report.inserted
        );
        Ok(report)
    }

    /// Set the label of an existing record and bump its timestamp.
    ///
    /// Tokens are trimmed and blank ones dropped; `EmptyLabels` when none
    /// remain, `InvalidLabel` for a token the export could not represent.
    /// Returns the number of rows touched: 0 when the identifier is unknown
    /// (no record is created), 1 otherwise.
    pub fn update_label<S: AsRef<str>>(&self, identifier: &str, labels: &[S]) -> Result<usize> {
        let label = record::join_labels(&record::normalize_labels(labels)?);
        tracing::info!("Updating {} with {}", identifier, label);

        let count = self.lock().execute(
            "UPDATE records SET label = ?1, last_modified = ?2 WHERE identifier = ?3",
            params![label, record::format_timestamp(&record::now()), identifier],
        )?;

        tracing::info!("Rows updated = {}", count);
        Ok(count)
    }

    // ========== Read Operations ==========

    /// Pick one unlabelled record uniformly at random
    pub fn next_unlabelled(&self) -> Result<Option<Record>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM records WHERE label IS NULL ORDER BY RANDOM() LIMIT 1"
        );
        self.lock()
            .query_row(&sql, [], row_to_record)
            .optional()
            .map_err(Into::into)
    }

    /// Get a record by identifier, if present
    pub fn find(&self, identifier: &str) -> Result<Option<Record>> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM records WHERE identifier = ?1");
        self.lock()
            .query_row(&sql, [identifier], row_to_record)
            .optional()
            .map_err(Into::into)
    }

    /// Get a record by identifier, failing with `NotFound` when absent
    pub fn get(&self, identifier: &str) -> Result<Record> {
        self.find(identifier)?
            .ok_or_else(|| Error::NotFound(identifier.to_string()))
    }

    /// Aggregate progress counts, read in a single statement
    pub fn status(&self) -> Result<Status> {
        let (total, pending): (i64, i64) = self.lock().query_row(
            "SELECT COUNT(*), COALESCE(SUM(label IS NULL), 0) FROM records",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let total = total as usize;
        let pending = pending as usize;
        Ok(Status { total, pending, done: total - pending })
    }

    /// Stream every labelled record, most recently modified first.
    ///
    /// Rows are handed to `f` as they are read; nothing is buffered. Returns
    /// the number of records visited. Each call re-queries storage.
    /// The connection stays locked while `f` runs, so `f` must not call back
    /// into the store.
    pub fn for_each_labelled<F>(&self, mut f: F) -> Result<usize>
    where
        F: FnMut(&Record) -> Result<()>,
    {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM records WHERE label IS NOT NULL \
             ORDER BY last_modified DESC, identifier ASC"
        ))?;

        let mut rows = stmt.query([])?;
        let mut visited = 0;
        while let Some(row) = rows.next()? {
            let rec = row_to_record(row)?;
            f(&rec)?;
            visited += 1;
        }
        Ok(visited)
    }

    /// Collect every labelled record, most recently modified first
    pub fn list_labelled(&self) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        self.for_each_labelled(|rec| {
            records.push(rec.clone());
            Ok(())
        })?;
        Ok(records)
    }

    // ========== Lifecycle ==========

    /// Flush and close the underlying connection
    pub fn close(self) -> Result<()> {
        let conn = self.conn.into_inner().unwrap_or_else(PoisonError::into_inner);
        match &self.path {
            Some(path) => tracing::info!("Closing record store at {}", path.display()),
            None => tracing::debug!("Closing in-memory record store"),
        }
        conn.close().map_err(|(_, e)| e.into())
    }
}

/// Helper to convert a row to a Record
fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<Record> {
    let ts_str: String = row.get(2)?;
    let last_modified = record::parse_timestamp(&ts_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Record {
        identifier: row.get(0)?,
        label: row.get(1)?,
        last_modified,
    })
}

/// Outcome of an import batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Non-blank identifiers offered for insertion, duplicates included
    pub attempted: usize,
    /// Records that did not exist before and were created
    pub inserted: usize,
}

impl ImportReport {
    pub fn skipped(&self) -> usize {
        self.attempted - self.inserted
    }
}

/// Labelling progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Status {
    pub total: usize,
    pub pending: usize,
    pub done: usize,
}

impl Status {
    /// Share of records labelled, in percent
    pub fn percent_done(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.done as f64 * 100.0 / self.total as f64
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Labelling Status:")?;
        writeln!(f, "  Total: {}", self.total)?;
        writeln!(f, "  Pending: {}", self.pending)?;
        writeln!(f, "  Done: {}", self.done)
    }
}
