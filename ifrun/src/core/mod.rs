//! Deterministic, pure logic for the turn protocol.
//!
//! Core modules must be free of I/O side effects. They operate on byte
//! buffers and decoded messages and return deterministic outputs suitable for
//! tests.

pub mod format;
pub mod remglk;
pub mod render;
pub mod types;
