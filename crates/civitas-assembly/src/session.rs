//! Session state.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use civitas_types::{Citation, MemberId, SessionId, VoteChoice};

/// Phases of a deliberative session, strictly sequential. No skipping, no
/// re-entry to an earlier phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Opening,
    Deliberation,
    Voting,
    Record,
    Closed,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPhase::Opening => write!(f, "opening"),
            SessionPhase::Deliberation => write!(f, "deliberation"),
            SessionPhase::Voting => write!(f, "voting"),
            SessionPhase::Record => write!(f, "record"),
            SessionPhase::Closed => write!(f, "closed"),
        }
    }
}

/// A cast vote. At most one per member per session; recasting overwrites.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Vote {
    pub member_id: MemberId,
    pub choice: VoteChoice,
    pub constitutional_basis: Citation,
    pub cast_at: DateTime<Utc>,
    /// Sequence number of the ledger entry recording this vote.
    pub entry: u64,
}

/// A deliberative position submitted during the deliberation phase.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Submission {
    pub member_id: MemberId,
    pub position: String,
    pub citations: Vec<Citation>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    Passed,
    Failed,
    /// No decision could be reached; re-convene with a new session.
    Deadlocked,
}

/// The final count. Abstentions are recorded but excluded from the pass
/// denominator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub ayes: u64,
    pub nays: u64,
    pub abstentions: u64,
}

impl Tally {
    pub fn decided(&self) -> u64 {
        self.ayes + self.nays
    }
}

/// A deliberative session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeliberativeSession {
    pub id: SessionId,
    /// Sequential session number, for the institutional record.
    pub number: u64,
    pub matter: String,
    pub matter_citation: Citation,
    pub proposer: MemberId,
    /// Whether emergency powers were active at open time. Fixes the floor;
    /// never revised afterward.
    pub emergency: bool,
    /// Constitutional-amendment matters require a two-thirds supermajority.
    pub requires_supermajority: bool,
    pub phase: SessionPhase,
    pub opened_at: DateTime<Utc>,
    pub deliberation_floor_end: DateTime<Utc>,
    pub votes: BTreeMap<MemberId, Vote>,
    pub submissions: Vec<Submission>,
    pub outcome: Option<SessionOutcome>,
    pub tally: Option<Tally>,
    /// Sequence number of the record entry written at close.
    pub record_entry: Option<u64>,
    pub closed_at: Option<DateTime<Utc>>,
    /// For a passed amendment: the instant at which it takes effect, after
    /// the mandatory waiting period. Consumers apply the amendment only
    /// once `now` passes this; it is not re-voted.
    pub pending_effective_at: Option<DateTime<Utc>>,
}

impl DeliberativeSession {
    /// Whether a passed amendment from this session is in effect at `now`.
    pub fn amendment_in_effect_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.outcome, Some(SessionOutcome::Passed))
            && self
                .pending_effective_at
                .is_some_and(|effective| now >= effective)
    }

    pub(crate) fn tally_votes(&self) -> Tally {
        let mut tally = Tally {
            ayes: 0,
            nays: 0,
            abstentions: 0,
        };
        for vote in self.votes.values() {
            match vote.choice {
                VoteChoice::Aye => tally.ayes += 1,
                VoteChoice::Nay => tally.nays += 1,
                VoteChoice::Abstain => tally.abstentions += 1,
            }
        }
        tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_are_ordered() {
        assert!(SessionPhase::Opening < SessionPhase::Deliberation);
        assert!(SessionPhase::Voting < SessionPhase::Record);
        assert!(SessionPhase::Record < SessionPhase::Closed);
    }

    #[test]
    fn tally_excludes_abstentions_from_the_decided_count() {
        let tally = Tally {
            ayes: 3,
            nays: 1,
            abstentions: 5,
        };
        assert_eq!(tally.decided(), 4);
    }
}
