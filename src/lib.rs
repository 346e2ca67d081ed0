//! # Document Synchronizer
//!
//! A real-time replication hook that mirrors every accepted write on a
//! source shard into a target collection, via a user-supplied transform
//! script.
//!
//! ## Architecture
//!
//! The synchronizer observes writes at the shard level and drives each
//! one through a short per-event pipeline:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────────┐
//! │                           doc-synchronizer                             │
//! │                                                                        │
//! │  ┌─────────────┐    ┌───────────────┐    ┌──────────────────────────┐  │
//! │  │ EventSource │───►│ WritePipeline │───►│ ReplicationClient        │  │
//! │  │ (per shard) │    │ decode +      │    │ (async submit, external  │  │
//! │  └─────────────┘    │ transform     │    │  versioning)             │  │
//! │                     └───────────────┘    └──────────────────────────┘  │
//! │                             │                                          │
//! │                             ▼                                          │
//! │                     ┌───────────────┐                                  │
//! │                     │ ReportSink    │                                  │
//! │                     │ (failures)    │                                  │
//! │                     └───────────────┘                                  │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Delivery Semantics
//!
//! 1. **Per-event containment**: a decode, transform, or replication
//!    failure drops exactly that event and reports it; the stream continues.
//! 2. **Latest write wins**: requests carry the source version under
//!    external versioning, so reordered completions converge on the
//!    highest version.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use doc_synchronizer::{
//!     DocumentSynchronizer, LocalEventSource, NoOpReplicationClient, ShardId,
//!     SyncConfig, TracingReportSink,
//! };
//! use doc_synchronizer::transform::IdentityTransform;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = SyncConfig {
//!         target_collection: "orders_mirror".into(),
//!         ..Default::default()
//!     };
//!
//!     let source = Arc::new(LocalEventSource::new());
//!     let sync = DocumentSynchronizer::attach(
//!         ShardId::new("orders", 0),
//!         config,
//!         source.clone(),
//!         Arc::new(IdentityTransform),
//!         Arc::new(NoOpReplicationClient),
//!         Arc::new(TracingReportSink),
//!     )
//!     .expect("Failed to attach");
//!
//!     // Writes emitted on the shard now replicate until shutdown
//!     sync.shutdown();
//! }
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod metrics;
pub mod pipeline;
pub mod replication;
pub mod report;
pub mod source;
pub mod synchronizer;
pub mod transform;

// Re-exports for convenience
pub use config::{ScriptConfig, SyncConfig};
pub use error::{Result, SyncError};
pub use event::{Document, VersionPolicy, WriteEvent, WriteKind, WriteOrigin};
pub use pipeline::WritePipeline;
pub use replication::{NoOpReplicationClient, ReplicationClient, ReplicationRequest};
pub use report::{FailureReport, ReportSink, TracingReportSink};
pub use source::{EventSource, LocalEventSource, ShardId, SubscriptionHandle, WriteObserver};
pub use synchronizer::{DocumentSynchronizer, SyncState};
pub use transform::{IdentityTransform, ScriptRef, TransformEngine, TransformExecutable};
