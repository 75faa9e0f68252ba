//! # civitas-types
//!
//! Shared domain types for the Civitas governance kernel: member identity,
//! constitutional branches, permission tiers, citations, and the standing
//! orders that parameterize institutional timing.
//!
//! Everything here is plain data. The enforcement logic lives in the
//! `civitas-authority`, `civitas-assembly`, `civitas-process`, and
//! `civitas-emergency` crates; the institutional record lives in
//! `civitas-ledger`.

pub mod citation;
pub mod ids;
pub mod member;
pub mod orders;
pub mod tier;

pub use citation::{Citation, CitationError};
pub use ids::{ActivationId, MemberId, NoticeId, SessionId};
pub use member::{Branch, Member, MemberType, MembershipTier};
pub use orders::StandingOrders;
pub use tier::{founding_tiers, ActionClass, PermissionTier, TierLevel};

/// Voting positions in the assembly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    Aye,
    Nay,
    Abstain,
}

impl std::fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoteChoice::Aye => write!(f, "aye"),
            VoteChoice::Nay => write!(f, "nay"),
            VoteChoice::Abstain => write!(f, "abstain"),
        }
    }
}
