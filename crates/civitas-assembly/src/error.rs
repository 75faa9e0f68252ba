use chrono::{DateTime, Utc};
use thiserror::Error;

use civitas_authority::AuthorityError;
use civitas_emergency::EmergencyError;
use civitas_ledger::LedgerError;
use civitas_types::{CitationError, MemberId, SessionId};

use crate::session::SessionPhase;

#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("unknown session: {0}")]
    SessionNotFound(SessionId),

    /// The operation is not valid in the session's current phase. The
    /// session is unaffected.
    #[error("session {id} is in {phase}, operation requires {expected}")]
    WrongPhase {
        id: SessionId,
        phase: SessionPhase,
        expected: SessionPhase,
    },

    /// Voting cannot open before the deliberation floor has elapsed.
    #[error("deliberation floor runs until {until}")]
    DeliberationFloorNotElapsed { until: DateTime<Utc> },

    /// A vote without a stated constitutional basis is rejected before
    /// being counted.
    #[error("vote missing constitutional basis: {0}")]
    VoteMissingBasis(#[from] CitationError),

    #[error("matter citation rejected: {0}")]
    MatterMissingCitation(CitationError),

    /// Close was attempted without quorum. The session remains in voting.
    #[error("quorum not met: {0}")]
    QuorumNotMet(String),

    #[error("proposer {member} lacks standing: {reason}")]
    ProposerLacksStanding { member: MemberId, reason: String },

    #[error("voter {0} is not constitutionally instantiated")]
    VoterNotInstantiated(MemberId),

    #[error(transparent)]
    Authority(#[from] AuthorityError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Emergency(#[from] EmergencyError),

    #[error("assembly lock poisoned")]
    LockPoisoned,
}
