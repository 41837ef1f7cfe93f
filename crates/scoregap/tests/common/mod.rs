//! Shared test utilities for scoregap integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated runs with temp directories
//! - `ScriptedFetcher` and `RecordingProgress` doubles for the batch driver
//! - Builders for catalog items and leaderboards

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::*;
