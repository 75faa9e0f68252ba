//! Trigger signals, thresholds, and the detection function.

use std::collections::BTreeMap;

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Conditions that can activate emergency powers, in severity order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    /// Ledger verification failure or other tamper evidence.
    IntegrityThreat,
    /// A recorded violation of constitutional process.
    ConstitutionalBreach,
    /// Portfolio drawdown past the configured loss ratio.
    PortfolioLoss,
    /// Externally reported market-wide event.
    SystemicMarketEvent,
    /// A critical role has gone silent.
    OperationalFailure,
}

/// One polled reading of the external signal feed.
///
/// How these are sourced (brokerage feed, health checks, audit runs) is
/// outside the kernel; they arrive as this typed mapping.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SignalReadings {
    /// Current drawdown as a fraction of portfolio value.
    pub portfolio_loss_ratio: f64,
    /// Chain verification failures observed since the last reading.
    pub chain_verification_failures: u64,
    /// Time since each critical role's last heartbeat, in seconds.
    pub critical_role_heartbeat_lag_secs: BTreeMap<String, i64>,
    /// Externally reported systemic market event.
    pub systemic_event: bool,
    /// A constitutional breach has been reported.
    pub constitutional_breach: bool,
}

/// Configured trigger thresholds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriggerThresholds {
    /// Loss ratio at or above which a portfolio-loss trigger fires.
    pub portfolio_loss_ratio: f64,
    /// Heartbeat staleness past which a role counts as failed, in seconds.
    pub heartbeat_staleness_secs: i64,
}

impl Default for TriggerThresholds {
    fn default() -> Self {
        Self {
            portfolio_loss_ratio: 0.15,
            heartbeat_staleness_secs: Duration::minutes(30).num_seconds(),
        }
    }
}

/// Evaluate one signal reading against the thresholds.
///
/// Pure and deterministic. When several conditions hold at once the most
/// severe wins: integrity first, then breach, loss, systemic event, and
/// operational failure last.
pub fn detect_trigger(
    signals: &SignalReadings,
    thresholds: &TriggerThresholds,
) -> Option<TriggerType> {
    if signals.chain_verification_failures > 0 {
        return Some(TriggerType::IntegrityThreat);
    }
    if signals.constitutional_breach {
        return Some(TriggerType::ConstitutionalBreach);
    }
    if signals.portfolio_loss_ratio >= thresholds.portfolio_loss_ratio {
        return Some(TriggerType::PortfolioLoss);
    }
    if signals.systemic_event {
        return Some(TriggerType::SystemicMarketEvent);
    }
    if signals
        .critical_role_heartbeat_lag_secs
        .values()
        .any(|lag| *lag > thresholds.heartbeat_staleness_secs)
    {
        return Some(TriggerType::OperationalFailure);
    }
    None
}
