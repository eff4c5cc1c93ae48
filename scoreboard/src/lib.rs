//! Scoring and ranking engine for claim-based leaderboards.
//!
//! Participants accrue points through claims that award a random amount in
//! `[1, 10]`. Every award is recorded in an append-only ledger, and the
//! leaderboard is always derived from a fresh snapshot. The crate enforces a
//! strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (types, ranking, reconciliation).
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (configuration, the durable
//!   journal). Isolated behind traits to enable fakes in tests.
//!
//! [`store`], [`ledger`] and [`claim`] hold the concurrency contract: a claim
//! updates one participant's score and appends its ledger entry under that
//! participant's lock, so the two never diverge. [`Scoreboard`] ties them
//! together for the CLI and the HTTP server.

pub mod award;
pub mod claim;
pub mod core;
pub mod error;
pub mod exit_codes;
mod ids;
pub mod io;
pub mod ledger;
pub mod logging;
mod scoreboard;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use crate::error::{Error, Result};
pub use crate::scoreboard::Scoreboard;
