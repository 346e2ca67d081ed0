//! Per-event write pipeline: decode, transform, replicate.
//!
//! One [`WritePipeline`] serves one shard subscription. For every
//! accepted write it:
//! 1. Decodes the opaque body into a structured document
//! 2. Acquires a fresh transform handle, binds the document as `_source`,
//!    and runs the script synchronously on the observing thread
//! 3. Builds a replication request from the ORIGINAL event's identity
//! 4. Submits it asynchronously on the target-side runtime
//!
//! # Failure Containment
//!
//! Every per-event failure drops exactly that event: a report goes to
//! the sink, a drop counter ticks, and the pipeline is ready for the
//! next write. Nothing is retried and nothing blocks the shard thread
//! waiting on the target.
//!
//! # Ordering
//!
//! Events enter the transform in shard order because the source calls
//! the observer synchronously per write. Replication completions are
//! unordered; external versioning on the target makes the latest source
//! version win regardless of arrival order.

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::event::{Document, WriteEvent};
use crate::metrics;
use crate::replication::{ReplicationClient, ReplicationRequest};
use crate::report::{FailureReport, ReportSink};
use crate::source::{ShardId, WriteObserver};
use crate::transform::{ScriptRef, TransformEngine, SOURCE_VAR};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Observer that replicates each accepted write to the target collection.
pub struct WritePipeline {
    shard: ShardId,
    /// Precomputed `index/shard` label for metrics.
    shard_label: String,
    collection: String,
    script: ScriptRef,
    log_document_detail: bool,
    engine: Arc<dyn TransformEngine>,
    client: Arc<dyn ReplicationClient>,
    sink: Arc<dyn ReportSink>,
    runtime: tokio::runtime::Handle,
}

impl WritePipeline {
    pub fn new(
        shard: ShardId,
        config: &SyncConfig,
        engine: Arc<dyn TransformEngine>,
        client: Arc<dyn ReplicationClient>,
        sink: Arc<dyn ReportSink>,
        runtime: tokio::runtime::Handle,
    ) -> Self {
        let shard_label = shard.to_string();
        Self {
            shard,
            shard_label,
            collection: config.target_collection.clone(),
            script: config.script_ref(),
            log_document_detail: config.log_document_detail,
            engine,
            client,
            sink,
            runtime,
        }
    }

    /// Collection replicated writes are sent to.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn report(&self, error: SyncError) {
        metrics::record_event_dropped(&self.shard_label, error.kind());
        self.sink.report(FailureReport::new(self.shard.clone(), error));
    }

    /// Run the transform script against one decoded document.
    ///
    /// Acquires a fresh handle per event: bound variables would
    /// otherwise leak from one document into the next run.
    fn run_transform(
        &self,
        event: &WriteEvent,
        source: Document,
    ) -> Result<Option<Document>, SyncError> {
        let started = Instant::now();

        let mut executable = self.engine.acquire(&self.script).map_err(|e| {
            SyncError::transform(&event.doc_type, &event.id, event.version, e.to_string())
        })?;

        executable.bind(SOURCE_VAR, Value::Object(source));
        let outcome = executable.run();

        metrics::record_transform_duration(&self.shard_label, started.elapsed());
        outcome.map_err(|e| {
            SyncError::transform(&event.doc_type, &event.id, event.version, e.to_string())
        })
    }

    /// Hand the request to the client on a spawned task.
    ///
    /// The observing thread returns immediately; the task reports the
    /// outcome when the target answers.
    fn submit(&self, request: ReplicationRequest) {
        metrics::record_replication_submitted(&self.shard_label);

        let client = Arc::clone(&self.client);
        let sink = Arc::clone(&self.sink);
        let shard = self.shard.clone();
        let label = self.shard_label.clone();
        let collection = request.collection.clone();
        let doc_type = request.doc_type.clone();
        let id = request.id.clone();
        let version = request.version;

        self.runtime.spawn(async move {
            let started = Instant::now();
            match client.submit_write(request).await {
                Ok(()) => {
                    metrics::record_replication_result(&label, true, started.elapsed());
                }
                Err(e) => {
                    metrics::record_replication_result(&label, false, started.elapsed());
                    metrics::record_event_dropped(&label, "replication");
                    sink.report(FailureReport::new(
                        shard,
                        SyncError::replication(collection, doc_type, id, version, e.to_string()),
                    ));
                }
            }
        });
    }
}

impl WriteObserver for WritePipeline {
    fn on_write(&self, event: &WriteEvent) {
        metrics::record_write_observed(
            &self.shard_label,
            event.kind.as_str(),
            event.origin.as_str(),
        );

        if self.log_document_detail {
            debug!(
                shard = %self.shard,
                kind = %event.kind,
                doc_type = %event.doc_type,
                id = %event.id,
                version = event.version,
                version_policy = %event.version_policy,
                origin = %event.origin,
                start_time_ms = event.start_time_ms,
                body_bytes = event.body.len(),
                "Observed write"
            );
        }

        let source = match event.decode_source() {
            Ok(doc) => doc,
            Err(e) => {
                self.report(e);
                return;
            }
        };

        let body = match self.run_transform(event, source) {
            Ok(Some(body)) => body,
            Ok(None) => {
                // Script declined this document; intentional, not a failure
                metrics::record_transform_skip(&self.shard_label);
                debug!(
                    shard = %self.shard,
                    doc_type = %event.doc_type,
                    id = %event.id,
                    "Transform skipped document"
                );
                return;
            }
            Err(e) => {
                self.report(e);
                return;
            }
        };

        self.submit(ReplicationRequest::from_event(&self.collection, event, body));
    }
}
