//! SQLite storage layer for the telemetry queue.
//!
//! SQLite is the ONLY durable store. The pending queue is a single table;
//! each operation is one transaction against it.
//!
//! # Design Principles
//!
//! - SQLite is the only source of truth
//! - Every enqueue commits before it is visible
//! - Rows are inserted and deleted, never mutated
//! - No pluggable engines, no alternative backends

use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::path::Path;

use crate::types::{ParkedRecord, Record, RecordId};

/// SQLite storage for pending and parked records.
pub struct QueueStore {
    conn: Connection,
}

impl QueueStore {
    /// Opens a SQLite database at the given path.
    ///
    /// Creates the database and schema if they don't exist.
    pub fn open(path: impl AsRef<Path>) -> SqliteResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Creates an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn in_memory() -> SqliteResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Initializes the database schema.
    fn init_schema(&self) -> SqliteResult<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS data_queue (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                data TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS dead_letter (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                record_id INTEGER NOT NULL,
                data TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                failed_at TEXT NOT NULL,
                attempts INTEGER NOT NULL,
                last_error TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_data_queue_timestamp ON data_queue(timestamp, id);
            "#,
        )?;
        Ok(())
    }

    // ========================================================================
    // Pending queue operations
    // ========================================================================

    /// Inserts a serialized reading, returning its assigned id.
    pub fn insert_record(&self, data: &str, timestamp: &str) -> SqliteResult<RecordId> {
        self.conn.execute(
            "INSERT INTO data_queue (data, timestamp) VALUES (?, ?)",
            params![data, timestamp],
        )?;
        Ok(RecordId(self.conn.last_insert_rowid()))
    }

    /// Gets the record with the smallest (timestamp, id), or None if the
    /// queue is empty. Read-only.
    pub fn oldest_record(&self) -> SqliteResult<Option<Record>> {
        self.conn
            .query_row(
                "SELECT id, data, timestamp FROM data_queue ORDER BY timestamp ASC, id ASC LIMIT 1",
                [],
                |row| {
                    Ok(Record {
                        id: RecordId(row.get(0)?),
                        data: row.get(1)?,
                        enqueued_at: row.get(2)?,
                    })
                },
            )
            .optional()
    }

    /// Deletes one record by id.
    ///
    /// Returns true if a row was deleted, false if it was already absent.
    pub fn delete_record(&self, id: RecordId) -> SqliteResult<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM data_queue WHERE id = ?", params![id.0])?;
        Ok(affected > 0)
    }

    /// Number of pending records.
    pub fn pending_count(&self) -> SqliteResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM data_queue", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ========================================================================
    // Dead-letter operations
    // ========================================================================

    /// Moves one record into the dead-letter table.
    ///
    /// Insert and delete happen in a single transaction so the record is
    /// never duplicated or lost in between. Returns false if the record was
    /// already gone from the pending queue.
    pub fn park_record(
        &mut self,
        id: RecordId,
        failed_at: &str,
        attempts: u32,
        last_error: &str,
    ) -> SqliteResult<bool> {
        let tx = self.conn.transaction()?;

        let record = tx
            .query_row(
                "SELECT data, timestamp FROM data_queue WHERE id = ?",
                params![id.0],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        let Some((data, timestamp)) = record else {
            return Ok(false);
        };

        tx.execute(
            "INSERT INTO dead_letter (record_id, data, timestamp, failed_at, attempts, last_error)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![id.0, data, timestamp, failed_at, attempts, last_error],
        )?;
        tx.execute("DELETE FROM data_queue WHERE id = ?", params![id.0])?;
        tx.commit()?;

        Ok(true)
    }

    /// Number of parked records.
    pub fn parked_count(&self) -> SqliteResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM dead_letter", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Lists parked records, oldest first.
    pub fn parked_records(&self) -> SqliteResult<Vec<ParkedRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT record_id, data, timestamp, failed_at, attempts, last_error
             FROM dead_letter ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ParkedRecord {
                record_id: RecordId(row.get(0)?),
                data: row.get(1)?,
                enqueued_at: row.get(2)?,
                failed_at: row.get(3)?,
                attempts: row.get::<_, i64>(4)? as u32,
                last_error: row.get(5)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}
