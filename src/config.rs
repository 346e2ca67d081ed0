//! Configuration for the document synchronizer.
//!
//! Defines the per-synchronizer settings. Configuration is passed to
//! [`DocumentSynchronizer::attach()`](crate::DocumentSynchronizer::attach)
//! and can be constructed programmatically or deserialized from YAML/JSON.
//!
//! # Quick Start
//!
//! ```rust
//! use doc_synchronizer::config::SyncConfig;
//!
//! let config = SyncConfig {
//!     target_collection: "orders_mirror".into(),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```
//!
//! # Configuration Structure
//!
//! ```text
//! SyncConfig
//! ├── target_collection: String    # Collection replicated writes land in
//! ├── script: ScriptConfig
//! │   ├── name: String             # Transform script name
//! │   └── lang: String             # Script language
//! └── log_document_detail: bool    # Per-event DEBUG record of each write
//! ```
//!
//! # YAML Example
//!
//! ```yaml
//! target_collection: "orders_mirror"
//!
//! script:
//!   name: "source_transform"
//!   lang: "groovy"
//!
//! log_document_detail: false
//! ```

use crate::error::{Result, SyncError};
use crate::transform::ScriptRef;
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// Top-level config: passed from host to DocumentSynchronizer::attach()
// ═══════════════════════════════════════════════════════════════════════════════

/// The top-level config object passed to `DocumentSynchronizer::attach()`.
///
/// # Fields
///
/// - `target_collection`: Where transformed documents are written.
/// - `script`: Which transform script to run per event.
/// - `log_document_detail`: Whether to log a DEBUG record of every observed write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Collection on the target side that replicated writes land in.
    /// Must be non-empty; validated at attach time.
    pub target_collection: String,

    /// Transform script to run against each document body.
    #[serde(default)]
    pub script: ScriptConfig,

    /// Log a DEBUG record of each observed write (kind, id, version, origin,
    /// body size). Useful when tracing a single document through the
    /// pipeline, noisy at volume.
    #[serde(default = "default_log_document_detail")]
    pub log_document_detail: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            target_collection: String::new(),
            script: ScriptConfig::default(),
            log_document_detail: default_log_document_detail(),
        }
    }
}

impl SyncConfig {
    /// Create a minimal config for testing.
    pub fn for_testing(target_collection: &str) -> Self {
        Self {
            target_collection: target_collection.to_string(),
            script: ScriptConfig::default(),
            log_document_detail: false,
        }
    }

    /// Check the config before any resource is acquired.
    pub fn validate(&self) -> Result<()> {
        if self.target_collection.is_empty() {
            return Err(SyncError::Config(
                "target_collection must not be empty".to_string(),
            ));
        }
        if self.script.name.is_empty() {
            return Err(SyncError::Config("script.name must not be empty".to_string()));
        }
        if self.script.lang.is_empty() {
            return Err(SyncError::Config("script.lang must not be empty".to_string()));
        }
        Ok(())
    }

    /// The script reference handed to the transform engine.
    pub fn script_ref(&self) -> ScriptRef {
        ScriptRef::new(&self.script.name, &self.script.lang)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ScriptConfig: which transform script runs per event
// ═══════════════════════════════════════════════════════════════════════════════

/// Transform script selection.
///
/// The engine resolves `name` in whatever way it stores scripts; this
/// crate never sees the script source itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptConfig {
    /// Script name resolved by the transform engine.
    #[serde(default = "default_script_name")]
    pub name: String,

    /// Script language.
    #[serde(default = "default_script_lang")]
    pub lang: String,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            name: default_script_name(),
            lang: default_script_lang(),
        }
    }
}

fn default_script_name() -> String {
    "source_transform".to_string()
}

fn default_script_lang() -> String {
    "groovy".to_string()
}

fn default_log_document_detail() -> bool {
    true
}
