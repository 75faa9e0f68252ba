//! The member directory.
//!
//! Membership is ledger-derived state: every admission is a `Membership`
//! entry, and an artificial member's instantiation entry is the sequence
//! number of the entry that admitted it. The in-memory map is a read cache
//! over that record.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::json;
use tracing::info;

use civitas_ledger::{EntryDraft, EntryType, Ledger};
use civitas_types::{Member, MemberId, MemberType, TierLevel};

use crate::error::AuthorityError;

pub struct MemberDirectory {
    ledger: Arc<dyn Ledger>,
    members: RwLock<HashMap<MemberId, Member>>,
}

impl MemberDirectory {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self {
            ledger,
            members: RwLock::new(HashMap::new()),
        }
    }

    /// Admit a member, recording the admission in the ledger.
    ///
    /// An artificial member must present a role and citation capability up
    /// front; its `instantiation_entry` is assigned here from the admission
    /// entry's sequence number, completing the four instantiation criteria.
    pub fn admit(&self, mut member: Member) -> Result<Member, AuthorityError> {
        if member.member_type == MemberType::Artificial {
            if member.role.is_none() {
                return Err(AuthorityError::NotInstantiated(format!(
                    "member {} has no defined role",
                    member.id
                )));
            }
            if !member.has_citation_capability {
                return Err(AuthorityError::NotInstantiated(format!(
                    "member {} lacks citation capability",
                    member.id
                )));
            }
        }

        {
            let members = self.members.read().map_err(|_| AuthorityError::LockPoisoned)?;
            if members.contains_key(&member.id) {
                return Err(AuthorityError::DuplicateMember(member.id));
            }
        }

        let entry = self.ledger.append(EntryDraft::new(
            EntryType::Membership,
            "membership_registrar",
            member.id,
            json!({
                "event": "admission",
                "member": {
                    "id": member.id,
                    "name": member.name,
                    "member_type": member.member_type,
                    "membership_tier": member.membership_tier,
                    "permission_tier": member.permission_tier,
                    "branch": member.branch,
                    "role": member.role,
                },
            }),
        ))?;

        if member.member_type == MemberType::Artificial {
            member.instantiation_entry = Some(entry.sequence_number);
        }

        info!(
            member = %member.id,
            name = %member.name,
            tier = %member.permission_tier,
            entry = entry.sequence_number,
            "member admitted"
        );

        let mut members = self.members.write().map_err(|_| AuthorityError::LockPoisoned)?;
        members.insert(member.id, member.clone());
        Ok(member)
    }

    pub fn member(&self, id: MemberId) -> Result<Member, AuthorityError> {
        let members = self.members.read().map_err(|_| AuthorityError::LockPoisoned)?;
        members
            .get(&id)
            .cloned()
            .ok_or(AuthorityError::UnknownMember(id))
    }

    /// The member holding the founding authority tier, if admitted.
    pub fn founder(&self) -> Result<Option<Member>, AuthorityError> {
        let members = self.members.read().map_err(|_| AuthorityError::LockPoisoned)?;
        Ok(members
            .values()
            .find(|m| m.permission_tier == TierLevel::Founder)
            .cloned())
    }

    pub fn all(&self) -> Result<Vec<Member>, AuthorityError> {
        let members = self.members.read().map_err(|_| AuthorityError::LockPoisoned)?;
        Ok(members.values().cloned().collect())
    }
}
