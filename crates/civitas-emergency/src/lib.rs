//! # civitas-emergency
//!
//! Emergency powers: trigger detection, the activation lifecycle, and the
//! background monitor loop.
//!
//! Trigger detection is a pure function over a typed signal reading and the
//! configured thresholds; the kernel never sources signals itself. At most
//! one activation is live at a time, every activation and expiry is a
//! ledger entry, and every activation demands a post-emergency review that
//! only an explicit review-completion clears.
//!
//! Expiry is a wall-clock deadline evaluated lazily: the poll loop checks
//! it on every tick, and [`EmergencyStatus::is_active_at`] performs the
//! same check on demand, so the two always agree.

pub mod error;
pub mod monitor;
pub mod signals;

pub use error::EmergencyError;
pub use monitor::{run_monitor, EmergencyActivation, EmergencyMonitor, EmergencyStatus, SignalSource};
pub use signals::{detect_trigger, SignalReadings, TriggerThresholds, TriggerType};
