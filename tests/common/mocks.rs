//! Mock seam implementations for testing.
//!
//! Records all calls for assertions and lets tests inject failures at
//! every pipeline stage: registration, transform, and replication.
//! Includes a versioned in-memory target store for out-of-order
//! completion tests.

use doc_synchronizer::event::{Document, WriteEvent, WriteKind};
use doc_synchronizer::replication::{BoxFuture, ClientError, ReplicationClient, ReplicationRequest};
use doc_synchronizer::report::{FailureReport, ReportSink};
use doc_synchronizer::source::{
    EventSource, ShardId, SourceError, SourceResult, SubscriptionHandle, WriteObserver,
};
use doc_synchronizer::transform::{
    ScriptError, ScriptRef, ScriptResult, TransformEngine, TransformExecutable, SOURCE_VAR,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;

/// Build a write event with a JSON body (uncompressed).
pub fn write_event(doc_type: &str, id: &str, version: u64, body: &str) -> WriteEvent {
    WriteEvent::new(
        WriteKind::Index,
        doc_type,
        id,
        version,
        body.as_bytes().to_vec(),
    )
}

/// Build a Document from a JSON value. Panics if not an object.
pub fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("expected JSON object, got {}", other),
    }
}

/// Poll `cond` until it holds or the timeout expires.
pub async fn wait_until<F: Fn() -> bool>(cond: F, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}

// =============================================================================
// MockEventSource
// =============================================================================

/// Mock implementation of EventSource that records all calls.
///
/// # Example
/// ```rust,ignore
/// let source = MockEventSource::new();
///
/// // Attach a synchronizer, then drive events through it
/// source.emit(&shard, &event);
///
/// // Assert what was called
/// assert_eq!(source.unsubscribe_calls(), 1);
/// ```
pub struct MockEventSource {
    next_id: AtomicU64,
    registrations: Mutex<HashMap<u64, (ShardId, Arc<dyn WriteObserver>)>>,
    reject_subscribe: AtomicBool,
    fail_unsubscribe: AtomicBool,
    subscribe_calls: AtomicUsize,
    unsubscribe_calls: AtomicUsize,
}

impl MockEventSource {
    /// Create a mock that accepts all registrations.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(1),
            registrations: Mutex::new(HashMap::new()),
            reject_subscribe: AtomicBool::new(false),
            fail_unsubscribe: AtomicBool::new(false),
            subscribe_calls: AtomicUsize::new(0),
            unsubscribe_calls: AtomicUsize::new(0),
        })
    }

    /// Create a mock that refuses every subscribe().
    pub fn rejecting() -> Arc<Self> {
        let source = Self::new();
        source.reject_subscribe.store(true, Ordering::SeqCst);
        source
    }

    /// Make unsubscribe() fail from now on.
    pub fn set_fail_unsubscribe(&self, fail: bool) {
        self.fail_unsubscribe.store(fail, Ordering::SeqCst);
    }

    /// Deliver an event to every observer registered for `shard`.
    pub fn emit(&self, shard: &ShardId, event: &WriteEvent) -> usize {
        let observers: Vec<Arc<dyn WriteObserver>> = {
            let registrations = self.registrations.lock().unwrap();
            registrations
                .values()
                .filter(|(s, _)| s == shard)
                .map(|(_, o)| Arc::clone(o))
                .collect()
        };
        for observer in &observers {
            observer.on_write(event);
        }
        observers.len()
    }

    /// Number of live registrations.
    pub fn active_subscriptions(&self) -> usize {
        self.registrations.lock().unwrap().len()
    }

    /// How many times subscribe() was called.
    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    /// How many times unsubscribe() was called.
    pub fn unsubscribe_calls(&self) -> usize {
        self.unsubscribe_calls.load(Ordering::SeqCst)
    }
}

impl EventSource for MockEventSource {
    fn subscribe(
        &self,
        shard: &ShardId,
        observer: Arc<dyn WriteObserver>,
    ) -> SourceResult<SubscriptionHandle> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_subscribe.load(Ordering::SeqCst) {
            return Err(SourceError("registration refused".to_string()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.registrations
            .lock()
            .unwrap()
            .insert(id, (shard.clone(), observer));
        Ok(SubscriptionHandle::new(id))
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) -> SourceResult<()> {
        self.unsubscribe_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_unsubscribe.load(Ordering::SeqCst) {
            return Err(SourceError("listener registry unavailable".to_string()));
        }
        match self.registrations.lock().unwrap().remove(&handle.id()) {
            Some(_) => Ok(()),
            None => Err(SourceError(format!(
                "unknown subscription handle {}",
                handle.id()
            ))),
        }
    }
}

// =============================================================================
// ScriptedTransform
// =============================================================================

type TransformFn = dyn Fn(Document) -> ScriptResult<Option<Document>> + Send + Sync;

/// Transform engine driven by a closure, recording every acquisition
/// and every variable bound per run.
pub struct ScriptedTransform {
    behavior: Arc<TransformFn>,
    acquisitions: AtomicUsize,
    /// Variable names bound on each acquired handle, in bind order.
    bound_vars: Arc<Mutex<Vec<Vec<String>>>>,
}

impl ScriptedTransform {
    /// Engine that applies `f` to each bound `_source` document.
    pub fn new<F>(f: F) -> Arc<Self>
    where
        F: Fn(Document) -> ScriptResult<Option<Document>> + Send + Sync + 'static,
    {
        Arc::new(Self {
            behavior: Arc::new(f),
            acquisitions: AtomicUsize::new(0),
            bound_vars: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Engine that passes every document through unchanged.
    pub fn identity() -> Arc<Self> {
        Self::new(|doc| Ok(Some(doc)))
    }

    /// Engine whose script always skips.
    pub fn skipping() -> Arc<Self> {
        Self::new(|_| Ok(None))
    }

    /// Engine whose script always fails.
    #[allow(dead_code)] // Useful for future tests
    pub fn failing(message: &str) -> Arc<Self> {
        let message = message.to_string();
        Self::new(move |_| Err(ScriptError(message.clone())))
    }

    /// How many handles were acquired (one per observed event).
    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    /// Variable names bound per run, in acquisition order.
    pub fn bound_vars(&self) -> Vec<Vec<String>> {
        self.bound_vars.lock().unwrap().clone()
    }
}

impl TransformEngine for ScriptedTransform {
    fn acquire(&self, _script: &ScriptRef) -> ScriptResult<Box<dyn TransformExecutable>> {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        let slot = {
            let mut log = self.bound_vars.lock().unwrap();
            log.push(Vec::new());
            log.len() - 1
        };
        Ok(Box::new(ScriptedExecutable {
            behavior: Arc::clone(&self.behavior),
            bound_vars: Arc::clone(&self.bound_vars),
            slot,
            source: None,
        }))
    }
}

struct ScriptedExecutable {
    behavior: Arc<TransformFn>,
    bound_vars: Arc<Mutex<Vec<Vec<String>>>>,
    slot: usize,
    source: Option<Document>,
}

impl TransformExecutable for ScriptedExecutable {
    fn bind(&mut self, name: &str, value: Value) {
        self.bound_vars.lock().unwrap()[self.slot].push(name.to_string());
        if name == SOURCE_VAR {
            if let Value::Object(map) = value {
                self.source = Some(map);
            }
        }
    }

    fn run(&mut self) -> ScriptResult<Option<Document>> {
        match self.source.take() {
            Some(doc) => (self.behavior)(doc),
            None => Ok(None),
        }
    }
}

// =============================================================================
// RecordingClient
// =============================================================================

/// Replication client that records every request.
pub struct RecordingClient {
    requests: RwLock<Vec<ReplicationRequest>>,
    submissions: AtomicUsize,
    /// Ids whose submissions should fail.
    fail_ids: Mutex<Vec<String>>,
}

impl RecordingClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            requests: RwLock::new(Vec::new()),
            submissions: AtomicUsize::new(0),
            fail_ids: Mutex::new(Vec::new()),
        })
    }

    /// Make submissions for this document id fail.
    pub fn fail_for(&self, id: &str) {
        self.fail_ids.lock().unwrap().push(id.to_string());
    }

    /// All recorded requests, in submission order.
    pub async fn submitted(&self) -> Vec<ReplicationRequest> {
        self.requests.read().await.clone()
    }

    /// How many submit_write() calls were made (including failures).
    pub fn submission_count(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    /// Wait until at least `n` submissions were made.
    pub async fn wait_for_submissions(&self, n: usize, timeout: Duration) -> bool {
        wait_until(|| self.submission_count() >= n, timeout).await
    }
}

impl ReplicationClient for RecordingClient {
    fn submit_write(&self, request: ReplicationRequest) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let fail = self.fail_ids.lock().unwrap().contains(&request.id);
            self.requests.write().await.push(request);
            self.submissions.fetch_add(1, Ordering::SeqCst);
            if fail {
                Err(ClientError("target unavailable".to_string()))
            } else {
                Ok(())
            }
        })
    }
}

// =============================================================================
// VersionedStore
// =============================================================================

#[derive(Debug, Clone)]
pub struct StoredDoc {
    pub version: u64,
    pub body: Document,
}

/// In-memory target store enforcing external versioning.
///
/// Accepts a write only when its version is strictly greater than the
/// stored one, the same acceptance rule a real target applies.
/// Per-version delays let tests reorder completions deliberately.
pub struct VersionedStore {
    docs: RwLock<HashMap<(String, String, String), StoredDoc>>,
    delays: Mutex<HashMap<u64, Duration>>,
    accepted: AtomicUsize,
    rejected: AtomicUsize,
}

impl VersionedStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            docs: RwLock::new(HashMap::new()),
            delays: Mutex::new(HashMap::new()),
            accepted: AtomicUsize::new(0),
            rejected: AtomicUsize::new(0),
        })
    }

    /// Delay completion of submissions carrying this version.
    pub fn delay_version(&self, version: u64, delay: Duration) {
        self.delays.lock().unwrap().insert(version, delay);
    }

    /// Fetch a stored document.
    pub async fn get(&self, collection: &str, doc_type: &str, id: &str) -> Option<StoredDoc> {
        self.docs
            .read()
            .await
            .get(&(
                collection.to_string(),
                doc_type.to_string(),
                id.to_string(),
            ))
            .cloned()
    }

    /// Writes accepted so far.
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Writes rejected as version conflicts.
    pub fn rejected(&self) -> usize {
        self.rejected.load(Ordering::SeqCst)
    }

    /// Total completed submissions, accepted or not.
    pub fn completed(&self) -> usize {
        self.accepted() + self.rejected()
    }
}

impl ReplicationClient for VersionedStore {
    fn submit_write(&self, request: ReplicationRequest) -> BoxFuture<'_, ()> {
        let delay = self
            .delays
            .lock()
            .unwrap()
            .get(&request.version)
            .copied()
            .unwrap_or(Duration::ZERO);

        Box::pin(async move {
            if delay > Duration::ZERO {
                tokio::time::sleep(delay).await;
            }

            let key = (
                request.collection.clone(),
                request.doc_type.clone(),
                request.id.clone(),
            );
            let mut docs = self.docs.write().await;
            if let Some(existing) = docs.get(&key) {
                if request.version <= existing.version {
                    self.rejected.fetch_add(1, Ordering::SeqCst);
                    return Err(ClientError(format!(
                        "version conflict: {} <= stored {}",
                        request.version, existing.version
                    )));
                }
            }
            docs.insert(
                key,
                StoredDoc {
                    version: request.version,
                    body: request.body,
                },
            );
            self.accepted.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}

// =============================================================================
// RecordingSink
// =============================================================================

/// Failure sink that collects every report.
pub struct RecordingSink {
    reports: Mutex<Vec<FailureReport>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            reports: Mutex::new(Vec::new()),
        })
    }

    /// Stage labels of all reports, in arrival order.
    pub fn stages(&self) -> Vec<&'static str> {
        self.reports.lock().unwrap().iter().map(|r| r.stage()).collect()
    }

    /// Rendered messages of all reports.
    pub fn messages(&self) -> Vec<String> {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.error.to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.reports.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait until at least `n` reports arrived.
    pub async fn wait_for_reports(&self, n: usize, timeout: Duration) -> bool {
        wait_until(|| self.len() >= n, timeout).await
    }
}

impl ReportSink for RecordingSink {
    fn report(&self, report: FailureReport) {
        self.reports.lock().unwrap().push(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_versioned_store_rejects_stale_version() {
        let store = VersionedStore::new();
        let event_new = write_event("doc", "1", 5, "{}");
        let event_old = write_event("doc", "1", 3, "{}");

        store
            .submit_write(ReplicationRequest::from_event("t", &event_new, Document::new()))
            .await
            .unwrap();
        let stale = store
            .submit_write(ReplicationRequest::from_event("t", &event_old, Document::new()))
            .await;

        assert!(stale.is_err());
        assert_eq!(store.get("t", "doc", "1").await.unwrap().version, 5);
        assert_eq!(store.accepted(), 1);
        assert_eq!(store.rejected(), 1);
    }

    #[tokio::test]
    async fn test_scripted_transform_records_bound_vars() {
        let engine = ScriptedTransform::identity();
        let mut exec = engine
            .acquire(&ScriptRef::new("source_transform", "groovy"))
            .unwrap();
        exec.bind(SOURCE_VAR, serde_json::json!({"a": 1}));
        let out = exec.run().unwrap().unwrap();

        assert_eq!(out.get("a"), Some(&serde_json::json!(1)));
        assert_eq!(engine.acquisitions(), 1);
        assert_eq!(engine.bound_vars(), vec![vec![SOURCE_VAR.to_string()]]);
    }

    #[tokio::test]
    async fn test_recording_client_fail_for() {
        let client = RecordingClient::new();
        client.fail_for("2");

        let ok = client
            .submit_write(ReplicationRequest::from_event(
                "t",
                &write_event("doc", "1", 1, "{}"),
                Document::new(),
            ))
            .await;
        let failed = client
            .submit_write(ReplicationRequest::from_event(
                "t",
                &write_event("doc", "2", 1, "{}"),
                Document::new(),
            ))
            .await;

        assert!(ok.is_ok());
        assert!(failed.is_err());
        assert_eq!(client.submitted().await.len(), 2);
    }
}
