//! # UplinkWorker: store-and-forward dispatcher
//!
//! The single background worker that drains the durable telemetry queue to
//! the collector, gated by a cheap network reachability probe.
//!
//! ## Overview
//!
//! ```text
//! ┌────────────────┐     ┌──────────────┐     ┌───────────────┐
//! │ TelemetryQueue │────▶│ UplinkWorker │────▶│   Collector   │
//! │   (SQLite)     │     │ (Dispatcher) │     │    (HTTP)     │
//! └────────────────┘     └──────┬───────┘     └───────────────┘
//!                               │
//!                        ┌──────▼───────┐
//!                        │ Reachability │
//!                        │    Probe     │
//!                        └──────────────┘
//! ```
//!
//! ## State machine
//!
//! - **Idle**: sleep one poll interval, probe the network. Unreachable
//!   stays Idle and touches no record; reachable moves to Draining.
//! - **Draining**: peek the oldest record and hand it to the delivery
//!   client. Acknowledged → remove it, sleep the inter-send delay, keep
//!   draining. Failed → Blocked with the record still at the head. Empty
//!   queue → Idle.
//! - **Blocked**: behaves like Idle, so the next reachable cycle retries
//!   the *same* head record. Delivery is strictly in-order: a head record
//!   that keeps failing blocks everything behind it. That trade is
//!   deliberate; the opt-in `max_delivery_failures` budget is the only way
//!   past it.
//!
//! ## Lifecycle
//!
//! Construction only wires dependencies. [`UplinkWorker::start`] spawns the
//! loop and returns a [`WorkerHandle`]; [`WorkerHandle::shutdown`] lets the
//! in-flight record finish and then stops the task. The handle owns the
//! worker: dropping it stops the loop at its next await point.
//!
//! ## Example
//!
//! ```ignore
//! use uplink_retriable_worker::{UplinkWorker, UplinkWorkerConfig};
//!
//! let worker = UplinkWorker::new(UplinkWorkerConfig::default(), client, queue);
//! let handle = worker.start();
//!
//! // ... producers enqueue readings, the worker drains them ...
//!
//! handle.shutdown().await;
//! ```

pub mod probe;

use std::time::Duration;

use collector_sync_sink::CollectorClient;
use telemetry_queue_core::{QueueHandle, RecordId};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Configuration for the dispatcher loop.
///
/// # Fields
///
/// - `poll_interval`: sleep between reachability checks (default: 1s)
/// - `send_delay`: sleep between consecutive successful sends (default: 1s)
/// - `probe_host` / `probe_port`: reachability target (default: 8.8.8.8:53)
/// - `probe_timeout`: budget for one probe connect (default: 3s)
/// - `max_delivery_failures`: opt-in dead-letter budget; `None` (the
///   default) retries the head record forever
#[derive(Debug, Clone)]
pub struct UplinkWorkerConfig {
    /// How long the dispatcher sleeps before re-checking reachability.
    pub poll_interval: Duration,
    /// Pause between consecutive successful sends.
    pub send_delay: Duration,
    /// Host probed to decide whether the network path is up.
    pub probe_host: String,
    /// Port probed on the probe host.
    pub probe_port: u16,
    /// Budget for one probe connection attempt.
    pub probe_timeout: Duration,
    /// Consecutive failed delivery rounds after which the head record is
    /// parked in the dead-letter table. `None` preserves indefinite
    /// blocking retry.
    pub max_delivery_failures: Option<u32>,
}

impl Default for UplinkWorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            send_delay: Duration::from_secs(1),
            probe_host: "8.8.8.8".to_string(),
            probe_port: 53,
            probe_timeout: Duration::from_secs(3),
            max_delivery_failures: None,
        }
    }
}

/// Dispatcher states. `Blocked` is `Idle` that knows the head record has
/// already failed at least once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerState {
    Idle,
    Draining,
    Blocked,
}

/// The store-and-forward dispatcher.
///
/// `new` only wires dependencies; nothing runs until [`start`](Self::start).
pub struct UplinkWorker {
    config: UplinkWorkerConfig,
    client: CollectorClient,
    queue: QueueHandle,
}

impl UplinkWorker {
    /// Wires a worker over the given queue and delivery client.
    pub fn new(config: UplinkWorkerConfig, client: CollectorClient, queue: QueueHandle) -> Self {
        Self {
            config,
            client,
            queue,
        }
    }

    /// Spawns the dispatcher loop on the current Tokio runtime.
    pub fn start(self) -> WorkerHandle {
        let (shutdown_sender, shutdown_receiver) = watch::channel(false);
        let task = tokio::spawn(run_loop(
            self.config,
            self.client,
            self.queue,
            shutdown_receiver,
        ));
        info!("uplink worker started");
        WorkerHandle {
            shutdown: shutdown_sender,
            task,
        }
    }
}

/// Cancellable handle to a running worker.
pub struct WorkerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    /// Signals the worker to stop and waits for it.
    ///
    /// A delivery in flight is allowed to finish (and its record to be
    /// removed) before the loop exits, so shutdown never strands an
    /// acknowledged record in the queue.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            warn!(error = %err, "uplink worker task ended abnormally");
        }
        info!("uplink worker stopped");
    }

    /// Whether the worker task has already exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Sleeps for `duration`, returning false when shutdown was requested (or
/// the handle was dropped) instead.
async fn sleep_or_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = shutdown.changed() => false,
    }
}

async fn run_loop(
    config: UplinkWorkerConfig,
    client: CollectorClient,
    queue: QueueHandle,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut state = WorkerState::Idle;
    // Consecutive failed delivery rounds for the current head record
    let mut head_failures: Option<(RecordId, u32)> = None;

    loop {
        if *shutdown.borrow() {
            break;
        }

        match state {
            WorkerState::Idle | WorkerState::Blocked => {
                if !sleep_or_shutdown(config.poll_interval, &mut shutdown).await {
                    break;
                }
                if probe::is_reachable(&config.probe_host, config.probe_port, config.probe_timeout)
                    .await
                {
                    if state == WorkerState::Blocked {
                        debug!("retrying head record after blocked cycle");
                    }
                    state = WorkerState::Draining;
                } else {
                    // Cycle skipped entirely, no record is touched
                    debug!("network unreachable, skipping dispatch cycle");
                    state = WorkerState::Idle;
                }
            }
            WorkerState::Draining => {
                let head = match queue.peek_oldest() {
                    Ok(head) => head,
                    Err(err) => {
                        warn!(error = %err, "failed to read queue head, backing off");
                        state = WorkerState::Idle;
                        continue;
                    }
                };

                let Some(record) = head else {
                    state = WorkerState::Idle;
                    continue;
                };
                let id = record.id;

                if client.deliver(&record).await {
                    head_failures = None;
                    match queue.remove(id) {
                        Ok(_) => {}
                        Err(err) => {
                            // The collector has the record; a redelivery
                            // after restart is the at-least-once trade-off
                            warn!(record_id = %id, error = %err, "failed to remove delivered record");
                            state = WorkerState::Idle;
                            continue;
                        }
                    }
                    if !sleep_or_shutdown(config.send_delay, &mut shutdown).await {
                        break;
                    }
                } else {
                    let failures = match head_failures {
                        Some((failed_id, count)) if failed_id == id => count + 1,
                        _ => 1,
                    };
                    head_failures = Some((id, failures));

                    if let Some(budget) = config.max_delivery_failures {
                        if failures >= budget {
                            match queue.park(id, failures, "delivery attempt budget exhausted") {
                                Ok(_) => {
                                    head_failures = None;
                                    // Head has moved on, keep draining
                                    continue;
                                }
                                Err(err) => {
                                    warn!(record_id = %id, error = %err, "failed to park record");
                                }
                            }
                        }
                    }

                    debug!(
                        record_id = %id,
                        failures = failures,
                        "head record undeliverable, dispatcher blocked"
                    );
                    state = WorkerState::Blocked;
                }
            }
        }
    }
}
