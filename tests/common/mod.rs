// tests/common/mod.rs
//! Common test utilities for sync engine integration tests.

pub mod recorder;

pub use recorder::Recorder;
