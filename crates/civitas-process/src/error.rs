use thiserror::Error;

use civitas_emergency::EmergencyError;
use civitas_ledger::LedgerError;
use civitas_types::{CitationError, NoticeId};

use crate::notice::NoticeStatus;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("unknown notice: {0}")]
    UnknownNotice(NoticeId),

    /// Enforcement attempted while the subject's response window is still
    /// open. The gate must be re-checked at a later `now`.
    #[error("response window open until {deadline} for notice {id}")]
    ResponseWindowOpen {
        id: NoticeId,
        deadline: chrono::DateTime<chrono::Utc>,
    },

    #[error("notice {id} is {status}, expected {expected}")]
    WrongStatus {
        id: NoticeId,
        status: NoticeStatus,
        expected: NoticeStatus,
    },

    #[error("notice basis rejected: {0}")]
    InvalidBasis(#[from] CitationError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Emergency(#[from] EmergencyError),

    #[error("notice desk lock poisoned")]
    LockPoisoned,
}
