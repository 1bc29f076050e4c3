//! Test suite for the telemetry queue core.

mod durability;
