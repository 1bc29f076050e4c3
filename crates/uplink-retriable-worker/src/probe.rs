//! Cheap reachability probe.
//!
//! One transport-level connect against a well-known host, dropped as soon
//! as it succeeds. The probe says nothing about the collector itself; it
//! only keeps the dispatcher from hot-looping sends into a dead network.

use std::time::Duration;

use tokio::net::TcpStream;
use tracing::debug;

/// Attempts a TCP connection to `host:port` within `timeout`.
///
/// Returns true on success; refused, timed out, and unresolvable all
/// collapse to false.
pub async fn is_reachable(host: &str, port: u16, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(stream)) => {
            drop(stream);
            true
        }
        Ok(Err(err)) => {
            debug!(host = %host, port = port, error = %err, "network probe failed");
            false
        }
        Err(_) => {
            debug!(host = %host, port = port, "network probe timed out");
            false
        }
    }
}
