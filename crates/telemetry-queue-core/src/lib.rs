//! # telemetry-queue-core
//!
//! A SQLite-backed store-and-forward queue for telemetry readings.
//!
//! ## Non-negotiable Principles
//!
//! - **SQLite is the only durable store** - Every reading commits to SQLite before
//!   anything else sees it
//! - **Oldest-first, always** - The dispatcher drains in enqueue order; the store
//!   never reorders
//! - **Removal requires acknowledgment** - A row is deleted only after the
//!   collector confirmed that exact record
//! - **Crash = resume from SQLite** - On restart the queue picks up at the oldest
//!   surviving row
//!
//! ## Architecture
//!
//! ```text
//! PRODUCER:
//!   enqueue → serialize → commit row
//!
//! DISPATCHER:
//!   peek oldest → deliver → remove on ack
//!
//! CRASH:
//!   reopen file → oldest row is still the head
//! ```
//!
//! ## Example
//!
//! ```rust
//! use telemetry_queue_core::{Payload, QueueReader, QueueWriter, TelemetryQueue};
//!
//! let queue = TelemetryQueue::in_memory().unwrap();
//!
//! let mut payload = Payload::new();
//! payload.insert("R001".to_string(), serde_json::Value::from("23.50"));
//!
//! // Fire-and-forget producer surface
//! queue.enqueue(&payload);
//!
//! // The dispatcher side
//! let record = queue.peek_oldest().unwrap().unwrap();
//! queue.remove(record.id).unwrap();
//! assert!(queue.peek_oldest().unwrap().is_none());
//! ```

mod queue;
mod store;
pub mod types;

#[cfg(test)]
mod tests;

pub use queue::TelemetryQueue;
pub use types::{ParkedRecord, Payload, Record, RecordId};

use std::sync::Arc;

/// Errors that can occur in the queue core.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// SQLite error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Payload could not be serialized for storage.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Read-side operations on the queue.
pub trait QueueReader {
    /// Returns the oldest pending record without removing it.
    fn peek_oldest(&self) -> Result<Option<Record>, QueueError>;

    /// Number of pending records.
    fn pending_count(&self) -> Result<u64, QueueError>;

    /// Number of records parked in the dead-letter table.
    fn parked_count(&self) -> Result<u64, QueueError>;
}

/// Write-side operations on the queue.
pub trait QueueWriter {
    /// Serializes and durably commits a reading, returning its assigned id.
    fn append(&self, payload: &Payload) -> Result<RecordId, QueueError>;

    /// Fire-and-forget producer surface: commits a reading and logs failures
    /// instead of returning them.
    fn enqueue(&self, payload: &Payload);

    /// Deletes exactly one record by id. Returns false if already absent.
    fn remove(&self, id: RecordId) -> Result<bool, QueueError>;

    /// Moves one record out of the pending queue into the dead-letter table.
    /// Returns false if the record was already gone.
    fn park(&self, id: RecordId, attempts: u32, error: &str) -> Result<bool, QueueError>;
}

/// Combined trait for queue storage access.
///
/// Bounds types that can both read and drain the queue, giving the
/// dispatcher a single handle over the store.
pub trait QueueAccess: QueueReader + QueueWriter {}

impl<T: QueueReader + QueueWriter> QueueAccess for T {}

/// Thread-safe handle for sharing the queue between producers and the dispatcher.
pub type QueueHandle = Arc<dyn QueueAccess + Send + Sync>;
