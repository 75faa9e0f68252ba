//! Members of the polity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::MemberId;
use crate::tier::TierLevel;

/// Constitutional branches. Every member acts within exactly one branch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    Legislative,
    Executive,
    Judicial,
    Monetary,
    Custodial,
}

/// Member classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberType {
    Human,
    Artificial,
}

/// Membership tiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipTier {
    Provisional,
    Full,
    Founding,
}

/// A member of the polity, human or artificial.
///
/// An artificial member is constitutionally instantiated only when it holds
/// a defined role, a recorded instantiation entry in the ledger, an assigned
/// permission tier, and citation capability - all four at once. An agent
/// that fails any criterion is a tool, not a member, and every authority
/// operation must refuse it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub member_type: MemberType,
    pub membership_tier: MembershipTier,
    pub permission_tier: TierLevel,
    pub branch: Branch,
    /// Constitutional role identifier, e.g. "portfolio_executive".
    pub role: Option<String>,
    /// Sequence number of the ledger entry recording instantiation.
    /// Required for artificial members.
    pub instantiation_entry: Option<u64>,
    /// Whether the member can produce constitutional citations.
    pub has_citation_capability: bool,
    pub admitted_at: DateTime<Utc>,
}

impl Member {
    /// Whether the member satisfies the instantiation criteria.
    ///
    /// Humans are instantiated by nature. Artificial members must satisfy
    /// all four criteria simultaneously.
    pub fn is_constitutionally_instantiated(&self) -> bool {
        match self.member_type {
            MemberType::Human => true,
            MemberType::Artificial => {
                self.role.is_some()
                    && self.instantiation_entry.is_some()
                    && self.has_citation_capability
            }
        }
    }

    /// Whether this member holds the founding authority tier.
    pub fn is_founder(&self) -> bool {
        self.permission_tier == TierLevel::Founder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artificial(role: Option<&str>, entry: Option<u64>, citation: bool) -> Member {
        Member {
            id: MemberId::generate(),
            name: "agent".into(),
            member_type: MemberType::Artificial,
            membership_tier: MembershipTier::Provisional,
            permission_tier: TierLevel::Tier(2),
            branch: Branch::Executive,
            role: role.map(String::from),
            instantiation_entry: entry,
            has_citation_capability: citation,
            admitted_at: Utc::now(),
        }
    }

    #[test]
    fn human_members_are_always_instantiated() {
        let mut m = artificial(None, None, false);
        m.member_type = MemberType::Human;
        assert!(m.is_constitutionally_instantiated());
    }

    #[test]
    fn artificial_member_needs_all_criteria() {
        assert!(artificial(Some("ops"), Some(3), true).is_constitutionally_instantiated());
        assert!(!artificial(None, Some(3), true).is_constitutionally_instantiated());
        assert!(!artificial(Some("ops"), None, true).is_constitutionally_instantiated());
        assert!(!artificial(Some("ops"), Some(3), false).is_constitutionally_instantiated());
    }
}
