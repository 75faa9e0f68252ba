use thiserror::Error;

use civitas_ledger::LedgerError;
use civitas_types::MemberId;

/// Errors from directory operations.
///
/// Permission outcomes are not errors; see
/// [`PermissionDecision`](crate::PermissionDecision).
#[derive(Error, Debug)]
pub enum AuthorityError {
    /// An artificial member failed an instantiation criterion at admission.
    #[error("artificial member not constitutionally instantiated: {0}")]
    NotInstantiated(String),

    #[error("member {0} is already admitted")]
    DuplicateMember(MemberId),

    #[error("unknown member: {0}")]
    UnknownMember(MemberId),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("directory lock poisoned")]
    LockPoisoned,
}
