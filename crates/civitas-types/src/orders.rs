//! Standing orders - the timing parameters of institutional process.
//!
//! These are legislative data, not code: a session may change them, and the
//! change is itself a ledger entry. The defaults are the Founding Era
//! values.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Timing parameters established by legislative standing order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingOrders {
    /// Minimum deliberation floor for regular sessions, in days.
    pub deliberation_floor_days: i64,
    /// Compressed deliberation floor under emergency powers, in hours.
    pub emergency_deliberation_hours: i64,
    /// Due-process response window, in hours.
    pub notice_response_hours: i64,
    /// Emergency powers time-to-live, in hours.
    pub emergency_duration_hours: i64,
    /// Waiting period before a ratified amendment takes effect, counted in
    /// full deliberation-cycle lengths.
    pub amendment_waiting_cycles: i64,
    /// Emergency monitor poll cadence, in seconds. A tunable, not a
    /// correctness property.
    pub poll_interval_secs: u64,
    /// Whether the Founding Era quorum and casting-vote rules apply.
    pub founding_era: bool,
}

impl Default for StandingOrders {
    fn default() -> Self {
        Self {
            deliberation_floor_days: 7,
            emergency_deliberation_hours: 24,
            notice_response_hours: 48,
            emergency_duration_hours: 48,
            amendment_waiting_cycles: 2,
            poll_interval_secs: 30,
            founding_era: true,
        }
    }
}

impl StandingOrders {
    /// Deliberation floor for a session opened now. The emergency floor is
    /// shorter, never absent.
    pub fn deliberation_floor(&self, emergency: bool) -> Duration {
        if emergency {
            Duration::hours(self.emergency_deliberation_hours)
        } else {
            Duration::days(self.deliberation_floor_days)
        }
    }

    pub fn notice_response_period(&self) -> Duration {
        Duration::hours(self.notice_response_hours)
    }

    pub fn emergency_duration(&self) -> Duration {
        Duration::hours(self.emergency_duration_hours)
    }

    /// Waiting period between amendment ratification and effect.
    pub fn amendment_waiting_period(&self) -> Duration {
        Duration::days(self.deliberation_floor_days * self.amendment_waiting_cycles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn founding_defaults() {
        let orders = StandingOrders::default();
        assert_eq!(orders.deliberation_floor(false), Duration::days(7));
        assert_eq!(orders.deliberation_floor(true), Duration::hours(24));
        assert_eq!(orders.notice_response_period(), Duration::hours(48));
        assert_eq!(orders.amendment_waiting_period(), Duration::days(14));
        assert!(orders.founding_era);
    }
}
