use thiserror::Error;

use civitas_ledger::LedgerError;
use civitas_types::ActivationId;

#[derive(Error, Debug)]
pub enum EmergencyError {
    /// At most one activation may be live; the existing one continues.
    #[error("emergency powers already active under activation {0}")]
    AlreadyActive(ActivationId),

    #[error("unknown activation: {0}")]
    UnknownActivation(ActivationId),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("monitor lock poisoned")]
    LockPoisoned,
}
