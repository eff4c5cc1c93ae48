//! Timestamp sequencing.

use chrono::{DateTime, TimeDelta, Utc};

/// Returns `now`, or one nanosecond past `last` when the clock has not moved
/// beyond it. Keeps creation and award timestamps strictly increasing.
pub fn strictly_after(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    match last {
        Some(prev) if now <= prev => prev + TimeDelta::nanoseconds(1),
        _ => now,
    }
}
