//! Wall-clock access, in one place, so the rest of the workspace never
//! calls `chrono::Utc::now()` directly.

use chrono::Utc;

use crate::types::Timestamp;

/// The current time as a Unix-seconds [`Timestamp`].
pub fn now() -> Timestamp {
    Utc::now().timestamp()
}

/// `now() + hours` as a [`Timestamp`], for soft-timeout and
/// mutual-deadline computations.
pub fn hours_from_now(hours: i64) -> Timestamp {
    now() + hours * 3600
}
