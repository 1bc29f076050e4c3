//! Collector delivery sink.
//!
//! One crate-level concern: take a durable [`Record`](telemetry_queue_core::Record)
//! and get it acknowledged by the remote collector, absorbing transient
//! blips with a bounded in-client retry loop. Everything longer-lived than
//! a blip is the dispatcher's problem.

mod client;
mod error;

pub use client::{CollectorClient, CollectorClientConfig};
pub use error::{DeliveryError, DeliveryResult};
