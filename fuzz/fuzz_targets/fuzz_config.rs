//! Fuzz target for config deserialization.
//!
//! This tests that parsing and validating a `SyncConfig` from arbitrary
//! bytes never panics.

#![no_main]

use doc_synchronizer::config::SyncConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(config) = serde_json::from_slice::<SyncConfig>(data) {
        let _ = config.validate();
        let _ = config.script_ref();
    }
});
