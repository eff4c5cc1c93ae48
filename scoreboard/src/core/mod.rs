//! Deterministic, pure logic shared by the scoreboard.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! snapshots and return deterministic outputs suitable for tests.

pub mod clock;
pub mod invariants;
pub mod ranking;
pub mod types;
