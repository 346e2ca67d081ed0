// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Write events observed on a source shard.
//!
//! A [`WriteEvent`] is the notification of one accepted document write:
//! identity (type + id), version, origin, and the stored body as an opaque
//! byte payload. Events are produced by the event source after the write is
//! durable, handed to the observer exactly once, and never mutated.
//!
//! # Body Decoding
//!
//! Source bodies are JSON objects, optionally zstd-compressed at rest.
//! [`WriteEvent::decode_source`] sniffs the zstd magic bytes, decompresses
//! when present, then parses the JSON. Anything that is not an object after
//! parsing is a decode failure: the transform contract binds an object to
//! `_source`, so arrays and scalars have no meaning here.

use crate::error::{Result, SyncError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Read;

/// zstd magic bytes for decompression detection
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// A decoded document body: string keys, arbitrary JSON values.
pub type Document = serde_json::Map<String, Value>;

/// Kind of indexing operation that produced a write.
///
/// Only creations and index-or-create operations reach the observer;
/// the event source filters everything else upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteKind {
    /// Document created for the first time.
    Create,
    /// Document indexed (created or replaced).
    Index,
}

impl WriteKind {
    /// Stable lowercase label (logging, metrics).
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteKind::Create => "create",
            WriteKind::Index => "index",
        }
    }
}

impl std::fmt::Display for WriteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the write originated on the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteOrigin {
    /// Accepted on the primary copy of the shard.
    Primary,
    /// Applied on a replica copy.
    Replica,
    /// Replayed during shard recovery.
    Recovery,
}

impl WriteOrigin {
    /// Stable lowercase label (logging, metrics).
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteOrigin::Primary => "primary",
            WriteOrigin::Replica => "replica",
            WriteOrigin::Recovery => "recovery",
        }
    }
}

impl std::fmt::Display for WriteOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Version numbering policy the source applied to this write.
///
/// Informational only: whatever the source used, replication always forces
/// external versioning on the target side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionPolicy {
    /// Source assigned the version sequentially.
    Internal,
    /// Caller supplied the version.
    External,
}

impl VersionPolicy {
    /// Stable lowercase label (logging, metrics).
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionPolicy::Internal => "internal",
            VersionPolicy::External => "external",
        }
    }
}

impl std::fmt::Display for VersionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One accepted document write on the source shard.
#[derive(Debug, Clone)]
pub struct WriteEvent {
    /// Operation kind (create vs index-or-create).
    pub kind: WriteKind,
    /// Document type.
    pub doc_type: String,
    /// Document id.
    pub id: String,
    /// Version, monotonic per document id.
    pub version: u64,
    /// Version policy the source applied.
    pub version_policy: VersionPolicy,
    /// Stored body: JSON, optionally zstd-compressed.
    pub body: Vec<u8>,
    /// Where the write originated.
    pub origin: WriteOrigin,
    /// Epoch millis when the source started the operation.
    pub start_time_ms: u64,
}

impl WriteEvent {
    /// Create an event stamped with the current time.
    pub fn new(
        kind: WriteKind,
        doc_type: impl Into<String>,
        id: impl Into<String>,
        version: u64,
        body: Vec<u8>,
    ) -> Self {
        Self {
            kind,
            doc_type: doc_type.into(),
            id: id.into(),
            version,
            version_policy: VersionPolicy::Internal,
            body,
            origin: WriteOrigin::Primary,
            start_time_ms: epoch_millis(),
        }
    }

    /// Set the origin (builder-style, for event source implementations).
    pub fn with_origin(mut self, origin: WriteOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Set the version policy (builder-style).
    pub fn with_version_policy(mut self, policy: VersionPolicy) -> Self {
        self.version_policy = policy;
        self
    }

    /// Decode the body into a structured document.
    ///
    /// Decompresses when the zstd magic is present, then parses JSON.
    /// Fails if the payload is corrupt, not JSON, or not an object.
    pub fn decode_source(&self) -> Result<Document> {
        let raw = maybe_decompress(&self.body)
            .map_err(|msg| SyncError::decode_msg(&self.doc_type, &self.id, self.version, msg))?;

        let value: Value = serde_json::from_slice(&raw)
            .map_err(|e| SyncError::decode(&self.doc_type, &self.id, self.version, e))?;

        match value {
            Value::Object(map) => Ok(map),
            other => Err(SyncError::decode_msg(
                &self.doc_type,
                &self.id,
                self.version,
                format!("body is not a JSON object (got {})", json_type_name(&other)),
            )),
        }
    }
}

/// Decompress zstd data if it has the magic header, otherwise return as-is.
pub fn maybe_decompress(data: &[u8]) -> std::result::Result<Vec<u8>, String> {
    if data.len() >= 4 && data[..4] == ZSTD_MAGIC {
        let mut decoder = zstd::Decoder::new(data).map_err(|e| format!("zstd init: {}", e))?;
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .map_err(|e| format!("zstd decode: {}", e))?;
        Ok(decompressed)
    } else {
        Ok(data.to_vec())
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Current time as epoch milliseconds.
pub fn epoch_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
