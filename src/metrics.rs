//! Metrics for observability.
//!
//! Exports Prometheus-compatible metrics for:
//! - Writes observed per shard
//! - Transform outcomes (runs, skips, duration)
//! - Replication submissions and completions
//! - Dropped events by pipeline stage
//! - Subscription lifecycle
//!
//! # Metric Naming Convention
//!
//! All metrics are prefixed with `docsync_` and follow Prometheus conventions:
//! - Counters end in `_total`
//! - Gauges represent current state
//! - Histograms track distributions (duration, size)
//!
//! # Usage
//!
//! ```rust,no_run
//! use doc_synchronizer::metrics;
//! use std::time::Duration;
//!
//! // In the pipeline after a write arrives
//! metrics::record_write_observed("orders/0", "index", "primary");
//!
//! // After the transform ran
//! metrics::record_transform_duration("orders/0", Duration::from_micros(120));
//! ```

use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Record one observed write entering the pipeline.
pub fn record_write_observed(shard: &str, kind: &str, origin: &str) {
    counter!(
        "docsync_writes_observed_total",
        "shard" => shard.to_string(),
        "kind" => kind.to_string(),
        "origin" => origin.to_string()
    )
    .increment(1);
}

/// Record an event dropped at a pipeline stage (decode, transform, replication).
pub fn record_event_dropped(shard: &str, stage: &str) {
    counter!(
        "docsync_events_dropped_total",
        "shard" => shard.to_string(),
        "stage" => stage.to_string()
    )
    .increment(1);
}

/// Record a transform that chose to skip its document.
pub fn record_transform_skip(shard: &str) {
    counter!("docsync_transform_skips_total", "shard" => shard.to_string()).increment(1);
}

/// Record transform execution latency (acquire + bind + run).
pub fn record_transform_duration(shard: &str, duration: Duration) {
    histogram!("docsync_transform_duration_seconds", "shard" => shard.to_string())
        .record(duration.as_secs_f64());
}

/// Record a replication request handed to the client.
pub fn record_replication_submitted(shard: &str) {
    counter!("docsync_replication_submitted_total", "shard" => shard.to_string()).increment(1);
}

/// Record a replication completion and its round-trip latency.
pub fn record_replication_result(shard: &str, success: bool, duration: Duration) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "docsync_replication_completed_total",
        "shard" => shard.to_string(),
        "status" => status
    )
    .increment(1);
    histogram!("docsync_replication_duration_seconds", "shard" => shard.to_string())
        .record(duration.as_secs_f64());
}

/// Record a subscription lifecycle operation (subscribe, unsubscribe).
pub fn record_subscription_event(operation: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "docsync_subscription_events_total",
        "operation" => operation.to_string(),
        "status" => status
    )
    .increment(1);
}

/// Gauge bump when a synchronizer attaches.
pub fn record_subscription_attached() {
    gauge!("docsync_active_subscriptions").increment(1.0);
}

/// Gauge drop when a synchronizer shuts down.
pub fn record_subscription_detached() {
    gauge!("docsync_active_subscriptions").decrement(1.0);
}
