// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Replication client integration traits.
//!
//! Defines the interface for writing transformed documents to the target
//! collection. Submissions are asynchronous and fire-and-forget: the
//! pipeline awaits each future on a spawned task, reports failures, and
//! never retries.
//!
//! Every request carries the ORIGINAL event's version under external
//! versioning, so the target resolves concurrent writes to the same id
//! by version number rather than arrival order.
//!
//! # Example
//!
//! ```rust,no_run
//! use doc_synchronizer::replication::{
//!     BoxFuture, ReplicationClient, ReplicationRequest,
//! };
//!
//! struct MyClient { /* ... */ }
//!
//! impl ReplicationClient for MyClient {
//!     fn submit_write(&self, request: ReplicationRequest) -> BoxFuture<'_, ()> {
//!         Box::pin(async move {
//!             let _ = request;
//!             Ok(())
//!         })
//!     }
//! }
//! ```

use crate::event::{Document, WriteEvent};
use std::future::Future;
use std::pin::Pin;

/// Result type for replication client operations.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Type alias for boxed async futures (reduces trait signature complexity).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = ClientResult<T>> + Send + 'a>>;

/// Simplified error for replication client operations.
#[derive(Debug, Clone)]
pub struct ClientError(pub String);

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ClientError {}

/// One index request against the target collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicationRequest {
    /// Target collection name.
    pub collection: String,
    /// Document type, copied from the source event.
    pub doc_type: String,
    /// Document id, copied from the source event.
    pub id: String,
    /// Source version, applied on the target as an external version.
    pub version: u64,
    /// Always `true`: the target must compare versions, not overwrite.
    pub external_versioning: bool,
    /// Transformed body to store.
    pub body: Document,
}

impl ReplicationRequest {
    /// Build a request from the original event's identity and a
    /// transformed body.
    ///
    /// The version travels unchanged from the source write and external
    /// versioning is forced, whatever policy the source used.
    pub fn from_event(collection: &str, event: &WriteEvent, body: Document) -> Self {
        Self {
            collection: collection.to_string(),
            doc_type: event.doc_type.clone(),
            id: event.id.clone(),
            version: event.version,
            external_versioning: true,
            body,
        }
    }
}

/// Trait defining what we need from the target-side client.
///
/// The host provides an implementation of this trait. The client decides
/// transport, addressing, and what "version conflict" means on its side;
/// the pipeline only submits and observes success or failure.
///
/// This trait allows testing with mocks and decouples us from any
/// particular target store.
pub trait ReplicationClient: Send + Sync + 'static {
    /// Submit one index request to the target collection.
    ///
    /// Resolves `Ok(())` once the target accepted the write, or an error
    /// describing the rejection (version conflict, transport failure, ...).
    fn submit_write(&self, request: ReplicationRequest) -> BoxFuture<'_, ()>;
}

/// A no-op implementation for testing/standalone mode.
///
/// Logs requests but doesn't actually write anything.
#[derive(Clone)]
pub struct NoOpReplicationClient;

impl ReplicationClient for NoOpReplicationClient {
    fn submit_write(&self, request: ReplicationRequest) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            tracing::debug!(
                collection = %request.collection,
                doc_type = %request.doc_type,
                id = %request.id,
                version = request.version,
                fields = request.body.len(),
                "NoOp: would submit write"
            );
            Ok(())
        })
    }
}
