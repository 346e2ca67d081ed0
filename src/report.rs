//! Failure reporting.
//!
//! The pipeline never logs failures directly: it hands a
//! [`FailureReport`] to an injected [`ReportSink`] and moves on. Hosts
//! pick a sink wired to their logging or alerting,
//! [`TracingReportSink`] being the default.
//!
//! Per-event failures (decode, transform, replication) affect only the
//! event they name. Lifecycle failures (subscription, config) concern
//! the synchronizer itself.

use crate::error::SyncError;
use crate::source::ShardId;

/// One failure, with enough context to find the document involved.
#[derive(Debug)]
pub struct FailureReport {
    /// Shard the synchronizer is attached to.
    pub shard: ShardId,
    /// What went wrong; carries operation type, id, and version where
    /// the stage has them.
    pub error: SyncError,
}

impl FailureReport {
    pub fn new(shard: ShardId, error: SyncError) -> Self {
        Self { shard, error }
    }

    /// Pipeline stage that failed ("decode", "transform", ...).
    pub fn stage(&self) -> &'static str {
        self.error.kind()
    }
}

/// Receives failure reports from the pipeline.
///
/// Called from shard threads and from spawned replication tasks, so
/// implementations must be concurrent-safe and should return quickly.
pub trait ReportSink: Send + Sync + 'static {
    fn report(&self, report: FailureReport);
}

/// Default sink: structured log records via `tracing`.
///
/// Per-event failures log at WARN (the stream continues); lifecycle
/// failures log at ERROR.
#[derive(Clone)]
pub struct TracingReportSink;

impl ReportSink for TracingReportSink {
    fn report(&self, report: FailureReport) {
        if report.error.is_event_scoped() {
            tracing::warn!(
                shard = %report.shard,
                stage = report.stage(),
                error = %report.error,
                "Synchronization failure, event dropped"
            );
        } else {
            tracing::error!(
                shard = %report.shard,
                stage = report.stage(),
                error = %report.error,
                "Synchronizer lifecycle failure"
            );
        }
    }
}
