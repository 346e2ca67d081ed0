//! Shared test utilities for integration tests.
//!
//! This module provides:
//! - Mock event source with controllable registration failures
//! - Scripted transform engine for exact-output scenarios
//! - Recording replication client and failure sink
//! - A versioned in-memory target store

pub mod mocks;

pub use mocks::*;
