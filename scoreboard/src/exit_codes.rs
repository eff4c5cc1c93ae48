//! Stable exit codes for scoreboard CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Command failed due to invalid config, storage errors or other failures.
pub const FAILED: i32 = 1;
/// The referenced participant does not exist.
pub const NOT_FOUND: i32 = 2;
/// Input was rejected (empty or duplicate name, malformed id).
pub const REJECTED: i32 = 3;
/// `scoreboard verify` found scores that disagree with the ledger.
pub const INCONSISTENT: i32 = 4;
