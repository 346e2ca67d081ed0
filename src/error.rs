// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Error types for the document synchronizer.
//!
//! This module defines the error taxonomy used throughout the crate.
//! Errors are categorized by the pipeline stage that produced them and
//! carry the identity of the document they concern.
//!
//! # Error Categories
//!
//! | Error Type | Scope | Description |
//! |------------|-------|-------------|
//! | `Decode` | per-event | Source body could not be parsed into a document |
//! | `Transform` | per-event | Script acquisition or execution failed |
//! | `Replication` | per-event | Target write failed or was version-rejected |
//! | `Subscription` | lifecycle | Event source registration/unregistration failed |
//! | `Config` | lifecycle | Configuration invalid at construction |
//!
//! # Containment
//!
//! Per-event errors are contained to the event that produced them: the event
//! is dropped and reported, and the synchronizer keeps serving subsequent
//! events. Only lifecycle errors surface to the caller, and only at
//! construction time. Use [`SyncError::is_event_scoped()`] to distinguish
//! the two classes.
//!
//! A transform that yields no result is *not* an error; it is the skip arm
//! of the transform contract and never appears in this taxonomy.

use thiserror::Error;

/// Result type alias for synchronizer operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors raised while synchronizing documents.
///
/// Each variant carries the identity of the document (or subsystem) it
/// concerns. Use [`kind()`](Self::kind) for a stable label suitable for
/// metrics, and [`is_event_scoped()`](Self::is_event_scoped) to check
/// whether the error was contained to a single event.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Source body could not be decoded into a structured document.
    ///
    /// Raised when the payload fails decompression, is not valid JSON,
    /// or parses to something other than an object. The event is dropped;
    /// the data is malformed at the source.
    #[error("Decode error for {doc_type}/{id} v{version}: {message}")]
    Decode {
        doc_type: String,
        id: String,
        version: u64,
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Transform script acquisition or execution failed.
    ///
    /// The event is dropped and reported; the synchronizer keeps running.
    #[error("Transform error for {doc_type}/{id} v{version}: {message}")]
    Transform {
        doc_type: String,
        id: String,
        version: u64,
        message: String,
    },

    /// Target write failed or was rejected by the version check.
    ///
    /// Reported once, never retried. A version-conflict rejection is the
    /// external-versioning guard doing its job and arrives through this
    /// variant like any other submission failure.
    #[error("Replication to '{collection}' failed for {doc_type}/{id} v{version}: {message}")]
    Replication {
        collection: String,
        doc_type: String,
        id: String,
        version: u64,
        message: String,
    },

    /// Event source subscription or unsubscription failed.
    ///
    /// Fatal when raised during construction (the synchronizer is not
    /// created). During teardown it is reported but shutdown completes.
    #[error("Subscription error: {0}")]
    Subscription(String),

    /// Invalid or missing configuration.
    ///
    /// Raised during construction if the config fails validation.
    /// Fix the configuration; nothing was registered.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// Create a Decode error from a serde_json cause.
    pub fn decode(
        doc_type: impl Into<String>,
        id: impl Into<String>,
        version: u64,
        source: serde_json::Error,
    ) -> Self {
        Self::Decode {
            doc_type: doc_type.into(),
            id: id.into(),
            version,
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Create a Decode error without a typed cause (e.g. decompression).
    pub fn decode_msg(
        doc_type: impl Into<String>,
        id: impl Into<String>,
        version: u64,
        message: impl Into<String>,
    ) -> Self {
        Self::Decode {
            doc_type: doc_type.into(),
            id: id.into(),
            version,
            message: message.into(),
            source: None,
        }
    }

    /// Create a Transform error for one document.
    pub fn transform(
        doc_type: impl Into<String>,
        id: impl Into<String>,
        version: u64,
        message: impl Into<String>,
    ) -> Self {
        Self::Transform {
            doc_type: doc_type.into(),
            id: id.into(),
            version,
            message: message.into(),
        }
    }

    /// Create a Replication error carrying the request identity.
    pub fn replication(
        collection: impl Into<String>,
        doc_type: impl Into<String>,
        id: impl Into<String>,
        version: u64,
        message: impl Into<String>,
    ) -> Self {
        Self::Replication {
            collection: collection.into(),
            doc_type: doc_type.into(),
            id: id.into(),
            version,
            message: message.into(),
        }
    }

    /// Stable lowercase label for this error class (metrics, report fields).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode { .. } => "decode",
            Self::Transform { .. } => "transform",
            Self::Replication { .. } => "replication",
            Self::Subscription(_) => "subscription",
            Self::Config(_) => "config",
        }
    }

    /// Check if this error is contained to a single event.
    ///
    /// Event-scoped errors drop one event and leave the synchronizer
    /// serving; lifecycle errors concern construction or teardown.
    pub fn is_event_scoped(&self) -> bool {
        match self {
            Self::Decode { .. } => true,
            Self::Transform { .. } => true,
            Self::Replication { .. } => true,
            Self::Subscription(_) => false, // construction/teardown only
            Self::Config(_) => false,
        }
    }
}
