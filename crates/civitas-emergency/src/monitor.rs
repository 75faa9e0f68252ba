//! Activation lifecycle and the background poll loop.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::time::{interval, Duration as TokioDuration};
use tracing::{error, info, warn};
use uuid::Uuid;

use civitas_ledger::{EntryDraft, EntryType, Ledger};
use civitas_types::{ActivationId, MemberId, StandingOrders};

use crate::error::EmergencyError;
use crate::signals::{detect_trigger, SignalReadings, TriggerThresholds, TriggerType};

/// A single grant of emergency powers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmergencyActivation {
    pub id: ActivationId,
    pub trigger_type: TriggerType,
    pub justification: Value,
    pub activated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Set on activation and never cleared automatically. Expiry of the
    /// powers does not discharge the review obligation.
    pub post_emergency_review_required: bool,
    pub review_completed: bool,
    pub expired_at: Option<DateTime<Utc>>,
}

struct MonitorState {
    current: Option<EmergencyActivation>,
    history: Vec<EmergencyActivation>,
}

struct Inner {
    ledger: Arc<dyn Ledger>,
    orders: StandingOrders,
    state: RwLock<MonitorState>,
}

/// The emergency powers monitor.
///
/// Cheap to clone; clones share the activation state.
#[derive(Clone)]
pub struct EmergencyMonitor {
    inner: Arc<Inner>,
}

/// Read handle onto the monitor, consumed by the assembly (compressed
/// deliberation floor) and the due-process desk (zero-wait notices).
#[derive(Clone)]
pub struct EmergencyStatus {
    inner: Arc<Inner>,
}

impl EmergencyMonitor {
    pub fn new(ledger: Arc<dyn Ledger>, orders: StandingOrders) -> Self {
        Self {
            inner: Arc::new(Inner {
                ledger,
                orders,
                state: RwLock::new(MonitorState {
                    current: None,
                    history: Vec::new(),
                }),
            }),
        }
    }

    pub fn status(&self) -> EmergencyStatus {
        EmergencyStatus {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn orders(&self) -> &StandingOrders {
        &self.inner.orders
    }

    /// Activate emergency powers.
    ///
    /// Fails with [`EmergencyError::AlreadyActive`] while another
    /// activation is live; the existing activation continues untouched.
    pub fn activate_at(
        &self,
        trigger_type: TriggerType,
        justification: Value,
        now: DateTime<Utc>,
    ) -> Result<EmergencyActivation, EmergencyError> {
        self.check_expiry_at(now)?;

        let mut state = self
            .inner
            .state
            .write()
            .map_err(|_| EmergencyError::LockPoisoned)?;
        if let Some(active) = &state.current {
            return Err(EmergencyError::AlreadyActive(active.id));
        }

        let activation = EmergencyActivation {
            id: ActivationId::generate(),
            trigger_type,
            justification: justification.clone(),
            activated_at: now,
            expires_at: now + self.inner.orders.emergency_duration(),
            post_emergency_review_required: true,
            review_completed: false,
            expired_at: None,
        };

        self.inner.ledger.append(
            EntryDraft::new(
                EntryType::Emergency,
                "emergency_monitor",
                MemberId(Uuid::nil()),
                json!({
                    "event": "activation",
                    "activation_id": activation.id,
                    "trigger_type": activation.trigger_type,
                    "justification": justification,
                    "expires_at": activation.expires_at,
                }),
            )
            .under_emergency(),
        )?;

        error!(
            activation = %activation.id,
            trigger = ?trigger_type,
            expires_at = %activation.expires_at,
            "emergency powers activated"
        );

        state.current = Some(activation.clone());
        Ok(activation)
    }

    pub fn activate(
        &self,
        trigger_type: TriggerType,
        justification: Value,
    ) -> Result<EmergencyActivation, EmergencyError> {
        self.activate_at(trigger_type, justification, Utc::now())
    }

    /// Deactivate a live activation whose TTL has lapsed.
    ///
    /// Returns the activation that expired, if any. The review obligation
    /// survives into the history.
    pub fn check_expiry_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<EmergencyActivation>, EmergencyError> {
        let mut state = self
            .inner
            .state
            .write()
            .map_err(|_| EmergencyError::LockPoisoned)?;

        let mut expired = match &state.current {
            Some(active) if now >= active.expires_at => active.clone(),
            _ => return Ok(None),
        };
        expired.expired_at = Some(now);

        // The activation stays live until the expiry entry is on the
        // record; a failed append must not lose the review obligation.
        self.inner.ledger.append(EntryDraft::new(
            EntryType::Emergency,
            "emergency_monitor",
            MemberId(Uuid::nil()),
            json!({
                "event": "expiry",
                "activation_id": expired.id,
                "activated_at": expired.activated_at,
                "expired_at": now,
                "post_emergency_review_required": true,
            }),
        ))?;

        warn!(
            activation = %expired.id,
            "emergency powers expired; post-emergency review still required"
        );

        state.current = None;
        state.history.push(expired.clone());
        Ok(Some(expired))
    }

    /// Record completion of the post-emergency judicial review.
    ///
    /// The only path by which the review obligation is discharged.
    pub fn complete_review(&self, id: ActivationId) -> Result<(), EmergencyError> {
        let mut state = self
            .inner
            .state
            .write()
            .map_err(|_| EmergencyError::LockPoisoned)?;

        let MonitorState { current, history } = &mut *state;
        let activation = history
            .iter_mut()
            .chain(current.iter_mut())
            .find(|a| a.id == id)
            .ok_or(EmergencyError::UnknownActivation(id))?;

        // The flag is cleared only once the review is on the record.
        self.inner.ledger.append(EntryDraft::new(
            EntryType::AuditFinding,
            "judicial_reviewer",
            MemberId(Uuid::nil()),
            json!({
                "event": "post_emergency_review_completed",
                "activation_id": id,
            }),
        ))?;
        activation.review_completed = true;

        info!(activation = %id, "post-emergency review completed");
        Ok(())
    }

    /// The live activation as of `now`, after the on-demand expiry check.
    pub fn current_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<EmergencyActivation>, EmergencyError> {
        self.check_expiry_at(now)?;
        let state = self
            .inner
            .state
            .read()
            .map_err(|_| EmergencyError::LockPoisoned)?;
        Ok(state.current.clone())
    }

    /// Activations awaiting review, newest first.
    pub fn pending_reviews(&self) -> Result<Vec<EmergencyActivation>, EmergencyError> {
        let state = self
            .inner
            .state
            .read()
            .map_err(|_| EmergencyError::LockPoisoned)?;
        let mut pending: Vec<_> = state
            .history
            .iter()
            .chain(state.current.iter())
            .filter(|a| !a.review_completed)
            .cloned()
            .collect();
        pending.reverse();
        Ok(pending)
    }
}

impl EmergencyStatus {
    /// Whether emergency powers are active as of `now`.
    ///
    /// Runs the same expiry check as the poll loop before answering, so a
    /// lapsed activation never reads as active no matter when the loop
    /// last ticked.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> Result<bool, EmergencyError> {
        let monitor = EmergencyMonitor {
            inner: Arc::clone(&self.inner),
        };
        Ok(monitor.current_at(now)?.is_some())
    }
}

/// A source of signal readings. Sourced outside the kernel.
pub trait SignalSource: Send + Sync {
    fn read(&self) -> SignalReadings;
}

/// Handle on the running poll loop.
pub struct MonitorTask {
    running: Arc<tokio::sync::RwLock<bool>>,
    handle: tokio::task::JoinHandle<()>,
}

impl MonitorTask {
    pub async fn stop(self) {
        {
            let mut running = self.running.write().await;
            *running = false;
        }
        let _ = self.handle.await;
    }
}

/// Spawn the background poll loop.
///
/// Each tick reads the signal feed, evaluates the triggers, activates on
/// detection, and runs the expiry check. Cadence comes from the standing
/// orders; it is a tunable, not a correctness property, because every
/// status read re-checks expiry on demand.
pub fn run_monitor(
    monitor: EmergencyMonitor,
    source: Arc<dyn SignalSource>,
    thresholds: TriggerThresholds,
) -> MonitorTask {
    let running = Arc::new(tokio::sync::RwLock::new(true));
    let poll_secs = monitor.inner.orders.poll_interval_secs.max(1);

    let loop_running = Arc::clone(&running);
    let handle = tokio::spawn(async move {
        let mut ticker = interval(TokioDuration::from_secs(poll_secs));

        loop {
            ticker.tick().await;

            if !*loop_running.read().await {
                break;
            }

            let now = Utc::now();
            if let Err(e) = monitor.check_expiry_at(now) {
                error!(error = %e, "emergency expiry check failed");
            }

            let signals = source.read();
            if let Some(trigger) = detect_trigger(&signals, &thresholds) {
                match monitor.activate_at(trigger, json!({ "signals": signals }), now) {
                    Ok(_) | Err(EmergencyError::AlreadyActive(_)) => {}
                    Err(e) => error!(error = %e, "emergency activation failed"),
                }
            }
        }
    });

    MonitorTask { running, handle }
}
