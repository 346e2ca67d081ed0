//! Transform script integration traits.
//!
//! Defines the interface for compiling and running the user-supplied
//! transform script that rewrites each document body before replication.
//!
//! Script state is never reused across events: the pipeline acquires a
//! fresh [`TransformExecutable`] per write, binds the decoded body, runs
//! it, and discards the handle. A cached handle would leak variables
//! bound for one document into the next run.
//!
//! # Example
//!
//! ```rust,no_run
//! use doc_synchronizer::transform::{
//!     ScriptRef, ScriptResult, TransformEngine, TransformExecutable,
//! };
//! use doc_synchronizer::event::Document;
//! use serde_json::Value;
//!
//! struct MyRuntime { /* ... */ }
//! struct MyHandle { vars: Vec<(String, Value)> }
//!
//! impl TransformEngine for MyRuntime {
//!     fn acquire(&self, _script: &ScriptRef) -> ScriptResult<Box<dyn TransformExecutable>> {
//!         Ok(Box::new(MyHandle { vars: Vec::new() }))
//!     }
//! }
//!
//! impl TransformExecutable for MyHandle {
//!     fn bind(&mut self, name: &str, value: Value) {
//!         self.vars.push((name.to_string(), value));
//!     }
//!
//!     fn run(&mut self) -> ScriptResult<Option<Document>> {
//!         Ok(None) // Real runtimes evaluate the script here
//!     }
//! }
//! ```

use crate::event::Document;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Variable name the decoded document body is bound under.
pub const SOURCE_VAR: &str = "_source";

/// Result type for transform operations.
pub type ScriptResult<T> = std::result::Result<T, ScriptError>;

/// Simplified error for transform operations.
#[derive(Debug, Clone)]
pub struct ScriptError(pub String);

impl std::fmt::Display for ScriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ScriptError {}

/// Identifies a transform script by name and language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRef {
    /// Script name, resolved by the engine (file name, stored id, ...).
    pub name: String,
    /// Script language the engine should compile with.
    pub lang: String,
}

impl ScriptRef {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }
}

impl std::fmt::Display for ScriptRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.lang, self.name)
    }
}

/// One single-use execution handle for a compiled script.
///
/// Bind variables, run once, discard. Handles are not reused.
pub trait TransformExecutable: Send {
    /// Bind a named variable visible to the script.
    fn bind(&mut self, name: &str, value: Value);

    /// Run the script against the bound variables.
    ///
    /// `Ok(None)` means the script chose to skip this document:
    /// the pipeline drops the event without replicating and without
    /// reporting a failure.
    fn run(&mut self) -> ScriptResult<Option<Document>>;
}

/// Trait defining what we need from a script runtime.
///
/// The host provides an implementation of this trait. Compilation and
/// caching of script sources is the engine's business; `acquire` only
/// promises a handle whose bound variables are private to that handle.
///
/// This trait allows testing with mocks and decouples us from any
/// particular script runtime.
pub trait TransformEngine: Send + Sync + 'static {
    /// Acquire a fresh execution handle for the given script.
    ///
    /// Called once per observed write. Fails if the script cannot be
    /// resolved or compiled.
    fn acquire(&self, script: &ScriptRef) -> ScriptResult<Box<dyn TransformExecutable>>;
}

/// A pass-through implementation for testing/standalone mode.
///
/// Echoes the bound `_source` document unchanged.
#[derive(Clone)]
pub struct IdentityTransform;

impl TransformEngine for IdentityTransform {
    fn acquire(&self, script: &ScriptRef) -> ScriptResult<Box<dyn TransformExecutable>> {
        tracing::debug!(script = %script, "Identity: acquired pass-through handle");
        Ok(Box::new(IdentityExecutable { source: None }))
    }
}

struct IdentityExecutable {
    source: Option<Value>,
}

impl TransformExecutable for IdentityExecutable {
    fn bind(&mut self, name: &str, value: Value) {
        if name == SOURCE_VAR {
            self.source = Some(value);
        }
    }

    fn run(&mut self) -> ScriptResult<Option<Document>> {
        match self.source.take() {
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(other) => Err(ScriptError(format!(
                "{} must be a JSON object, got {}",
                SOURCE_VAR, other
            ))),
            None => Ok(None),
        }
    }
}
