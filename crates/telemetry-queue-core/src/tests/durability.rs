//! Crash/restart durability tests.
//!
//! The queue must resume from the oldest surviving row after the process
//! that wrote it is gone; these tests simulate that by dropping the queue
//! and reopening the same file.

use crate::types::Payload;
use crate::{QueueReader, QueueWriter, TelemetryQueue};
use tempfile::NamedTempFile;

fn payload_of(key: &str, value: &str) -> Payload {
    let mut payload = Payload::new();
    payload.insert(key.to_string(), serde_json::Value::from(value));
    payload
}

#[test]
fn records_survive_reopen() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path();

    let (id_a, id_b) = {
        let queue = TelemetryQueue::open(path).unwrap();
        let id_a = queue.append(&payload_of("R001", "23.50")).unwrap();
        let id_b = queue.append(&payload_of("R002", "24.00")).unwrap();
        (id_a, id_b)
    };

    // After restart
    let queue = TelemetryQueue::open(path).unwrap();
    assert_eq!(queue.pending_count().unwrap(), 2);

    let head = queue.peek_oldest().unwrap().unwrap();
    assert_eq!(head.id, id_a);

    assert!(queue.remove(id_a).unwrap());
    assert_eq!(queue.peek_oldest().unwrap().unwrap().id, id_b);
}

#[test]
fn removal_survives_reopen() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path();

    let id_b = {
        let queue = TelemetryQueue::open(path).unwrap();
        let id_a = queue.append(&payload_of("R001", "1")).unwrap();
        let id_b = queue.append(&payload_of("R002", "2")).unwrap();
        queue.remove(id_a).unwrap();
        id_b
    };

    let queue = TelemetryQueue::open(path).unwrap();
    assert_eq!(queue.pending_count().unwrap(), 1);
    assert_eq!(queue.peek_oldest().unwrap().unwrap().id, id_b);
}

#[test]
fn ids_are_not_reused_after_restart() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path();

    let removed_id = {
        let queue = TelemetryQueue::open(path).unwrap();
        let id = queue.append(&payload_of("R001", "1")).unwrap();
        queue.remove(id).unwrap();
        id
    };

    // AUTOINCREMENT keeps removed ids retired across restarts
    let queue = TelemetryQueue::open(path).unwrap();
    let fresh_id = queue.append(&payload_of("R002", "2")).unwrap();
    assert!(fresh_id > removed_id);
}

#[test]
fn parked_records_survive_reopen() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path();

    {
        let queue = TelemetryQueue::open(path).unwrap();
        let id = queue.append(&payload_of("R001", "1")).unwrap();
        queue.park(id, 3, "timeout").unwrap();
    }

    let queue = TelemetryQueue::open(path).unwrap();
    assert_eq!(queue.pending_count().unwrap(), 0);
    assert_eq!(queue.parked_count().unwrap(), 1);
    assert_eq!(queue.parked_records().unwrap()[0].attempts, 3);
}
