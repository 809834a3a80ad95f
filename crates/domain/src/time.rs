//! Time and timestamp helpers.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// UTC timestamp used for `last_action`, `session_start`, click records, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Time elapsed from `since` to `until`, clamped to zero when `until` is
/// earlier than `since`.
#[must_use]
pub fn elapsed_between(since: Timestamp, until: Timestamp) -> Duration {
    (until - since).to_std().unwrap_or(Duration::ZERO)
}
