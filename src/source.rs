// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Write event sources and observer registration.
//!
//! An [`EventSource`] is the shard-side hook point: observers subscribe
//! for one shard's accepted writes and receive each event exactly once,
//! on the thread that performed the write. Observers must therefore be
//! safe to call concurrently and should hand anything slow off to a task.
//!
//! Subscriptions are represented by a [`SubscriptionHandle`] that is
//! deliberately neither `Clone` nor `Copy`: unsubscribing consumes the
//! handle, so a registration can only be torn down once.

use crate::event::WriteEvent;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Result type for event source operations.
pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Simplified error for event source operations.
#[derive(Debug, Clone)]
pub struct SourceError(pub String);

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for SourceError {}

/// Identifies one shard of a source index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShardId {
    /// Index the shard belongs to.
    pub index: String,
    /// Shard number within the index.
    pub shard: u32,
}

impl ShardId {
    pub fn new(index: impl Into<String>, shard: u32) -> Self {
        Self {
            index: index.into(),
            shard,
        }
    }
}

impl std::fmt::Display for ShardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.index, self.shard)
    }
}

/// Proof of one live subscription.
///
/// Returned by [`EventSource::subscribe`] and consumed by
/// [`EventSource::unsubscribe`]. Not cloneable: whoever holds it owns
/// the registration.
#[derive(Debug, PartialEq, Eq)]
pub struct SubscriptionHandle(u64);

impl SubscriptionHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Source-assigned registration id.
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Receives accepted writes for a subscribed shard.
///
/// Called on the writing thread, potentially from several shard threads
/// at once. Implementations must not assume exclusive access.
pub trait WriteObserver: Send + Sync {
    /// One accepted write. The event is complete by the time this runs;
    /// observers cannot veto or mutate it.
    fn on_write(&self, event: &WriteEvent);
}

/// Trait defining what we need from the shard-side event hook.
///
/// The host provides an implementation of this trait, allowing
/// observers to attach to real indexing machinery without this crate
/// knowing anything about it.
pub trait EventSource: Send + Sync + 'static {
    /// Register an observer for one shard's writes.
    ///
    /// Fails if the shard is unknown or the source refuses the
    /// registration; on failure nothing is retained and there is
    /// nothing to tear down.
    fn subscribe(
        &self,
        shard: &ShardId,
        observer: Arc<dyn WriteObserver>,
    ) -> SourceResult<SubscriptionHandle>;

    /// Remove a registration, consuming its handle.
    ///
    /// Fails if the handle is not (or no longer) registered.
    fn unsubscribe(&self, handle: SubscriptionHandle) -> SourceResult<()>;
}

struct Registration {
    shard: ShardId,
    observer: Arc<dyn WriteObserver>,
}

/// In-process event source for testing/standalone mode.
///
/// Holds registrations in a concurrent map and fans each emitted event
/// out to matching observers on the emitting thread, the same way a
/// real shard hook would.
pub struct LocalEventSource {
    next_id: AtomicU64,
    subscribers: DashMap<u64, Registration>,
}

impl LocalEventSource {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            subscribers: DashMap::new(),
        }
    }

    /// Deliver an event to every observer subscribed to `shard`.
    ///
    /// Observers are snapshotted before any is invoked, so no map guard
    /// is held while observer code runs; observers may freely subscribe
    /// or unsubscribe from within `on_write`. A registration added
    /// during an emit does not receive that event.
    ///
    /// Returns how many observers received it.
    pub fn emit(&self, shard: &ShardId, event: &WriteEvent) -> usize {
        let observers: Vec<Arc<dyn WriteObserver>> = self
            .subscribers
            .iter()
            .filter(|entry| entry.value().shard == *shard)
            .map(|entry| Arc::clone(&entry.value().observer))
            .collect();
        for observer in &observers {
            observer.on_write(event);
        }
        observers.len()
    }

    /// Number of live registrations across all shards.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl Default for LocalEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for LocalEventSource {
    fn subscribe(
        &self,
        shard: &ShardId,
        observer: Arc<dyn WriteObserver>,
    ) -> SourceResult<SubscriptionHandle> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.subscribers.insert(
            id,
            Registration {
                shard: shard.clone(),
                observer,
            },
        );
        tracing::debug!(shard = %shard, subscription = id, "Observer subscribed");
        Ok(SubscriptionHandle::new(id))
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) -> SourceResult<()> {
        let id = handle.id();
        match self.subscribers.remove(&id) {
            Some((_, registration)) => {
                tracing::debug!(
                    shard = %registration.shard,
                    subscription = id,
                    "Observer unsubscribed"
                );
                Ok(())
            }
            None => Err(SourceError(format!("unknown subscription handle {}", id))),
        }
    }
}
