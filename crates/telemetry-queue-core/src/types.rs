//! Core types for the telemetry queue.

use serde::{Deserialize, Serialize};

/// Identifier of a queued record, assigned by SQLite on insert.
///
/// Ids increase monotonically and are never reused, so they double as a
/// stable tiebreak when two records carry the same timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub i64);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A reading as supplied by a producer: opaque string keys mapped to
/// scalar/string values. The core never interprets it.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// One durable record in the pending queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Store-assigned id.
    pub id: RecordId,
    /// The payload exactly as serialized at commit time.
    pub data: String,
    /// RFC 3339 UTC timestamp captured at insert, fixed microsecond precision
    /// so lexicographic order is chronological order.
    pub enqueued_at: String,
}

/// A record moved out of the pending queue after exhausting its delivery
/// budget (opt-in policy only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParkedRecord {
    /// Id the record had while pending.
    pub record_id: RecordId,
    /// The original serialized payload.
    pub data: String,
    /// The original enqueue timestamp.
    pub enqueued_at: String,
    /// When the record was parked.
    pub failed_at: String,
    /// Delivery rounds spent before parking.
    pub attempts: u32,
    /// Last delivery error observed, for operator inspection.
    pub last_error: String,
}
