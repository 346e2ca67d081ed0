// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Synchronizer lifecycle.
//!
//! A [`DocumentSynchronizer`] owns one subscription on one source shard
//! and replicates every accepted write through its [`WritePipeline`].
//!
//! # State Transitions
//!
//! ```text
//!               attach()
//!  (no state) ───────────→ Active
//!                             │
//!                   shutdown()│
//!                             ↓
//!                       Unregistered
//! ```
//!
//! # State Descriptions
//!
//! - **Active**: Observer registered, events flowing to the target.
//! - **Unregistered**: Subscription removed. Terminal: a synchronizer
//!   never re-attaches; further `shutdown()` calls are no-ops.
//!
//! A failed `attach()` returns an error without constructing anything:
//! there is no partially-registered synchronizer to tear down.

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::metrics;
use crate::pipeline::WritePipeline;
use crate::replication::ReplicationClient;
use crate::report::{FailureReport, ReportSink};
use crate::source::{EventSource, ShardId, SubscriptionHandle, WriteObserver};
use crate::transform::TransformEngine;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// State of one document synchronizer.
///
/// See module docs for the state transition diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Observer registered and replicating writes.
    Active,

    /// Subscription removed.
    ///
    /// Terminal state: the synchronizer will not register again.
    Unregistered,
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncState::Active => write!(f, "Active"),
            SyncState::Unregistered => write!(f, "Unregistered"),
        }
    }
}

/// Replicates every accepted write on one source shard to a target
/// collection.
///
/// Constructed via [`attach()`](DocumentSynchronizer::attach), which
/// registers the write observer; dropped subscriptions are removed via
/// [`shutdown()`](DocumentSynchronizer::shutdown). The synchronizer is
/// safe to share across threads.
pub struct DocumentSynchronizer {
    shard: ShardId,
    source: Arc<dyn EventSource>,
    /// Written twice in a synchronizer's life: set on attach, taken on
    /// the first shutdown.
    subscription: Mutex<Option<SubscriptionHandle>>,
    pipeline: Arc<WritePipeline>,
    sink: Arc<dyn ReportSink>,
}

impl DocumentSynchronizer {
    /// Attach to a shard and start replicating its writes.
    ///
    /// Validates the config, captures the current tokio runtime for
    /// replication tasks, then registers the observer. Any failure
    /// returns an error with nothing registered and nothing retained.
    ///
    /// Must be called from within a tokio runtime.
    pub fn attach(
        shard: ShardId,
        config: SyncConfig,
        source: Arc<dyn EventSource>,
        engine: Arc<dyn TransformEngine>,
        client: Arc<dyn ReplicationClient>,
        sink: Arc<dyn ReportSink>,
    ) -> Result<Self> {
        config.validate()?;

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            SyncError::Subscription(
                "no tokio runtime available for replication tasks".to_string(),
            )
        })?;

        let pipeline = Arc::new(WritePipeline::new(
            shard.clone(),
            &config,
            engine,
            client,
            Arc::clone(&sink),
            runtime,
        ));

        let observer: Arc<dyn WriteObserver> = pipeline.clone();
        let handle = match source.subscribe(&shard, observer) {
            Ok(handle) => {
                metrics::record_subscription_event("subscribe", true);
                handle
            }
            Err(e) => {
                metrics::record_subscription_event("subscribe", false);
                return Err(SyncError::Subscription(e.to_string()));
            }
        };

        metrics::record_subscription_attached();
        info!(
            shard = %shard,
            collection = %pipeline.collection(),
            script = %config.script_ref(),
            "Synchronizing documents from shard to target collection"
        );

        Ok(Self {
            shard,
            source,
            subscription: Mutex::new(Some(handle)),
            pipeline,
            sink,
        })
    }

    /// Stop observing writes.
    ///
    /// Removes the subscription on the first call; later calls find it
    /// already gone and do nothing. An unsubscribe failure is reported
    /// to the sink but the synchronizer still ends Unregistered.
    ///
    /// Replication tasks already in flight are not cancelled.
    pub fn shutdown(&self) {
        let taken = {
            let mut guard = self
                .subscription
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            guard.take()
        };

        match taken {
            Some(handle) => {
                match self.source.unsubscribe(handle) {
                    Ok(()) => {
                        metrics::record_subscription_event("unsubscribe", true);
                    }
                    Err(e) => {
                        metrics::record_subscription_event("unsubscribe", false);
                        self.sink.report(FailureReport::new(
                            self.shard.clone(),
                            SyncError::Subscription(e.to_string()),
                        ));
                    }
                }
                metrics::record_subscription_detached();
                info!(shard = %self.shard, "Removed write observer for shard");
            }
            None => {
                debug!(shard = %self.shard, "Shutdown already complete");
            }
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SyncState {
        let guard = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if guard.is_some() {
            SyncState::Active
        } else {
            SyncState::Unregistered
        }
    }

    /// Check if the observer is still registered.
    pub fn is_active(&self) -> bool {
        matches!(self.state(), SyncState::Active)
    }

    /// Shard this synchronizer observes.
    pub fn shard(&self) -> &ShardId {
        &self.shard
    }

    /// Collection replicated writes are sent to.
    pub fn target_collection(&self) -> &str {
        self.pipeline.collection()
    }
}
