//! Daemon wiring and command implementations.

use std::sync::Arc;
use std::time::Duration;

use collector_sync_sink::{CollectorClient, CollectorClientConfig};
use telemetry_queue_core::{Payload, QueueReader, QueueWriter, TelemetryQueue};
use tracing::info;
use uplink_config_and_utils::{Config, Paths};
use uplink_retriable_worker::{UplinkWorker, UplinkWorkerConfig};

/// Opens the queue store under the configured base directory.
///
/// A failure here is the one fatal startup condition: without the store
/// nothing can be made durable.
fn open_queue(paths: &Paths) -> Result<Arc<TelemetryQueue>, Box<dyn std::error::Error>> {
    paths.ensure_dirs()?;
    let queue = TelemetryQueue::open(paths.database_file())?;
    Ok(Arc::new(queue))
}

fn client_config(config: &Config) -> CollectorClientConfig {
    CollectorClientConfig {
        endpoint_url: config.collector_url.clone(),
        headers: config.auth_headers.clone(),
        request_timeout: Duration::from_secs(config.request_timeout_secs),
        max_attempts: config.max_send_attempts,
        retry_delay: Duration::from_secs(config.send_retry_delay_secs),
    }
}

fn worker_config(config: &Config) -> UplinkWorkerConfig {
    UplinkWorkerConfig {
        poll_interval: Duration::from_secs(config.poll_interval_secs),
        send_delay: Duration::from_secs(config.send_delay_secs),
        probe_host: config.probe_host.clone(),
        probe_port: config.probe_port,
        probe_timeout: Duration::from_secs(config.probe_timeout_secs),
        max_delivery_failures: config.max_delivery_failures,
    }
}

/// Run the daemon until ctrl-c.
pub async fn run_daemon(config: Config, paths: Paths) -> Result<(), Box<dyn std::error::Error>> {
    // Reject an unusable collector URL before the worker starts probing
    let collector_url = config.collector_url()?;
    info!(collector = %collector_url, db = %paths.database_file().display(), "starting uplink daemon");

    let queue = open_queue(&paths)?;
    let pending = queue.pending_count()?;
    if pending > 0 {
        info!(pending = pending, "resuming with readings left from a previous run");
    }

    let client = CollectorClient::new(client_config(&config));
    let worker = UplinkWorker::new(worker_config(&config), client, queue.clone());
    let handle = worker.start();

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    handle.shutdown().await;

    Ok(())
}

/// Enqueue one reading from the command line.
pub fn enqueue_reading(paths: &Paths, data: &str) -> Result<(), Box<dyn std::error::Error>> {
    let payload: Payload = serde_json::from_str(data)?;

    let queue = open_queue(paths)?;
    let id = queue.append(&payload)?;

    println!("Enqueued record {}", id);
    Ok(())
}

/// Print queue counters.
pub fn show_status(paths: &Paths) -> Result<(), Box<dyn std::error::Error>> {
    let queue = open_queue(paths)?;

    println!("Queue database: {}", paths.database_file().display());
    println!("  Pending: {}", queue.pending_count()?);
    println!("  Parked:  {}", queue.parked_count()?);

    Ok(())
}
