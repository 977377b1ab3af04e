//! Deterministic `Clock` for tests.

use chrono::{DateTime, Duration, Utc};
use nightfall_core::clock::Clock;

/// A clock that always returns a fixed point in time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// A copy of this clock moved forward by `seconds`.
    #[must_use]
    pub fn advanced(self, seconds: i64) -> Self {
        Self(self.0 + Duration::seconds(seconds))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
