//! The TelemetryQueue - the shared surface over the SQLite store.
//!
//! Producers and the dispatcher both act on the same backing file; a single
//! mutex serializes every append/peek/remove so interleaved callers can
//! never observe a half-applied row set.
//!
//! # Write Path (strict order)
//!
//! 1. Serialize the payload (a failure here drops the reading, it is never
//!    half-persisted)
//! 2. Stamp the enqueue time
//! 3. Commit the row
//!
//! A record is visible to the dispatcher the moment step 3 commits.

use std::path::Path;
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};

use crate::store::QueueStore;
use crate::types::{ParkedRecord, Payload, Record, RecordId};
use crate::{QueueError, QueueReader, QueueWriter};

/// The durable telemetry queue.
///
/// All operations go through one mutex; each is a single transaction
/// against the backing SQLite file.
pub struct TelemetryQueue {
    store: Mutex<QueueStore>,
}

impl TelemetryQueue {
    /// Opens a queue backed by a SQLite database at the given path.
    ///
    /// A failure here is fatal to the caller: without the store there is
    /// nothing to enqueue into.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, QueueError> {
        let store = QueueStore::open(path)?;
        tracing::info!("telemetry queue store opened");
        Ok(Self {
            store: Mutex::new(store),
        })
    }

    /// Creates a queue backed by an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn in_memory() -> Result<Self, QueueError> {
        Ok(Self {
            store: Mutex::new(QueueStore::in_memory()?),
        })
    }

    /// Lists parked records, oldest first.
    pub fn parked_records(&self) -> Result<Vec<ParkedRecord>, QueueError> {
        let store = self.store.lock().expect("lock poisoned");
        Ok(store.parked_records()?)
    }

    /// RFC 3339 UTC timestamp with fixed microsecond precision.
    ///
    /// Fixed width keeps lexicographic order equal to chronological order,
    /// which the oldest-first query relies on.
    fn now_timestamp() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

impl QueueWriter for TelemetryQueue {
    fn append(&self, payload: &Payload) -> Result<RecordId, QueueError> {
        let data = serde_json::to_string(payload)?;
        let timestamp = Self::now_timestamp();

        let store = self.store.lock().expect("lock poisoned");
        let id = store.insert_record(&data, &timestamp)?;
        Ok(id)
    }

    fn enqueue(&self, payload: &Payload) {
        if let Err(err) = self.append(payload) {
            tracing::error!(error = %err, "failed to enqueue reading, record dropped");
        }
    }

    fn remove(&self, id: RecordId) -> Result<bool, QueueError> {
        let store = self.store.lock().expect("lock poisoned");
        let removed = store.delete_record(id)?;
        if removed {
            tracing::debug!(record_id = %id, "record removed from queue");
        }
        Ok(removed)
    }

    fn park(&self, id: RecordId, attempts: u32, error: &str) -> Result<bool, QueueError> {
        let failed_at = Self::now_timestamp();
        let mut store = self.store.lock().expect("lock poisoned");
        let parked = store.park_record(id, &failed_at, attempts, error)?;
        if parked {
            tracing::warn!(
                record_id = %id,
                attempts = attempts,
                error = %error,
                "record parked in dead-letter table"
            );
        }
        Ok(parked)
    }
}

impl QueueReader for TelemetryQueue {
    fn peek_oldest(&self) -> Result<Option<Record>, QueueError> {
        let store = self.store.lock().expect("lock poisoned");
        Ok(store.oldest_record()?)
    }

    fn pending_count(&self) -> Result<u64, QueueError> {
        let store = self.store.lock().expect("lock poisoned");
        Ok(store.pending_count()?)
    }

    fn parked_count(&self) -> Result<u64, QueueError> {
        let store = self.store.lock().expect("lock poisoned");
        Ok(store.parked_count()?)
    }
}
