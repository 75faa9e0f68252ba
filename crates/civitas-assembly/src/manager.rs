//! The deliberative cycle manager.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::info;

use civitas_authority::{check_permission, ActionRequest, MemberDirectory, PermissionDecision};
use civitas_emergency::EmergencyStatus;
use civitas_ledger::{EntryDraft, EntryType, Ledger};
use civitas_types::{
    ActionClass, Citation, MemberId, MemberType, PermissionTier, SessionId, StandingOrders,
    TierLevel, VoteChoice,
};

use crate::error::AssemblyError;
use crate::session::{
    DeliberativeSession, SessionOutcome, SessionPhase, Submission, Tally, Vote,
};

pub struct CycleManager {
    ledger: Arc<dyn Ledger>,
    directory: Arc<MemberDirectory>,
    emergency: EmergencyStatus,
    orders: StandingOrders,
    tiers: BTreeMap<TierLevel, PermissionTier>,
    sessions: RwLock<HashMap<SessionId, DeliberativeSession>>,
    next_number: AtomicU64,
}

impl CycleManager {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        directory: Arc<MemberDirectory>,
        emergency: EmergencyStatus,
        orders: StandingOrders,
        tiers: BTreeMap<TierLevel, PermissionTier>,
    ) -> Self {
        Self {
            ledger,
            directory,
            emergency,
            orders,
            tiers,
            sessions: RwLock::new(HashMap::new()),
            next_number: AtomicU64::new(1),
        }
    }

    /// Open a session on `matter`.
    ///
    /// Standing is decided by the permission engine: proposing is an
    /// operational act. Emergency status is sampled here, once; an
    /// activation after open neither compresses nor extends this
    /// session's floor.
    pub fn open_session_at(
        &self,
        matter: &str,
        matter_citation: Citation,
        proposer: MemberId,
        requires_supermajority: bool,
        now: DateTime<Utc>,
    ) -> Result<DeliberativeSession, AssemblyError> {
        matter_citation
            .validate()
            .map_err(AssemblyError::MatterMissingCitation)?;

        let member = self.directory.member(proposer)?;
        if let PermissionDecision::Forbidden { reason } = check_permission(
            &member,
            &ActionRequest::new(ActionClass::Operational),
            &self.tiers,
        ) {
            return Err(AssemblyError::ProposerLacksStanding {
                member: proposer,
                reason,
            });
        }

        let emergency = self.emergency.is_active_at(now)?;
        let floor_end = now + self.orders.deliberation_floor(emergency);
        let number = self.next_number.fetch_add(1, Ordering::SeqCst);

        let mut session = DeliberativeSession {
            id: SessionId::generate(),
            number,
            matter: matter.to_string(),
            matter_citation: matter_citation.clone(),
            proposer,
            emergency,
            requires_supermajority,
            phase: SessionPhase::Opening,
            opened_at: now,
            deliberation_floor_end: floor_end,
            votes: BTreeMap::new(),
            submissions: Vec::new(),
            outcome: None,
            tally: None,
            record_entry: None,
            closed_at: None,
            pending_effective_at: None,
        };

        let mut draft = EntryDraft::new(
            EntryType::SessionEvent,
            member.role.as_deref().unwrap_or("member"),
            proposer,
            json!({
                "event": "session_opened",
                "session_id": session.id,
                "session_number": number,
                "matter": matter,
                "matter_citation": matter_citation,
                "requires_supermajority": requires_supermajority,
                "deliberation_floor_end": floor_end,
            }),
        );
        if emergency {
            draft = draft.under_emergency();
        }
        self.ledger.append(draft)?;

        // Deliberation opens as soon as the session is on the record.
        session.phase = SessionPhase::Deliberation;

        info!(
            session = %session.id,
            number,
            emergency,
            floor_end = %floor_end,
            "session opened, deliberation running"
        );

        let mut sessions = self.sessions.write().map_err(|_| AssemblyError::LockPoisoned)?;
        sessions.insert(session.id, session.clone());
        Ok(session)
    }

    pub fn open_session(
        &self,
        matter: &str,
        matter_citation: Citation,
        proposer: MemberId,
        requires_supermajority: bool,
    ) -> Result<DeliberativeSession, AssemblyError> {
        self.open_session_at(matter, matter_citation, proposer, requires_supermajority, Utc::now())
    }

    pub fn advance_to_voting(&self, id: SessionId) -> Result<DeliberativeSession, AssemblyError> {
        self.advance_to_voting_at(id, Utc::now())
    }

    pub fn cast_vote(
        &self,
        id: SessionId,
        member_id: MemberId,
        choice: VoteChoice,
        basis: Citation,
    ) -> Result<Vote, AssemblyError> {
        self.cast_vote_at(id, member_id, choice, basis, Utc::now())
    }

    pub fn close_session(&self, id: SessionId) -> Result<DeliberativeSession, AssemblyError> {
        self.close_session_at(id, Utc::now())
    }

    pub fn session(&self, id: SessionId) -> Result<DeliberativeSession, AssemblyError> {
        let sessions = self.sessions.read().map_err(|_| AssemblyError::LockPoisoned)?;
        sessions.get(&id).cloned().ok_or(AssemblyError::SessionNotFound(id))
    }

    /// Submit a deliberative position. Deliberation phase only.
    pub fn submit_position_at(
        &self,
        id: SessionId,
        member_id: MemberId,
        position: &str,
        citations: Vec<Citation>,
        now: DateTime<Utc>,
    ) -> Result<(), AssemblyError> {
        let member = self.directory.member(member_id)?;

        let mut sessions = self.sessions.write().map_err(|_| AssemblyError::LockPoisoned)?;
        let session = sessions.get_mut(&id).ok_or(AssemblyError::SessionNotFound(id))?;
        require_phase(session, SessionPhase::Deliberation)?;

        self.ledger.append(EntryDraft::new(
            EntryType::SessionEvent,
            member.role.as_deref().unwrap_or("member"),
            member_id,
            json!({
                "event": "position_submitted",
                "session_id": id,
                "position": position,
                "citations": citations,
            }),
        ))?;

        session.submissions.push(Submission {
            member_id,
            position: position.to_string(),
            citations,
            submitted_at: now,
        });
        Ok(())
    }

    /// Move to voting once the deliberation floor has elapsed.
    ///
    /// There is no bypass: the floor may have been compressed at open
    /// time under emergency powers, but it is never waived.
    pub fn advance_to_voting_at(
        &self,
        id: SessionId,
        now: DateTime<Utc>,
    ) -> Result<DeliberativeSession, AssemblyError> {
        let mut sessions = self.sessions.write().map_err(|_| AssemblyError::LockPoisoned)?;
        let session = sessions.get_mut(&id).ok_or(AssemblyError::SessionNotFound(id))?;
        require_phase(session, SessionPhase::Deliberation)?;

        if now < session.deliberation_floor_end {
            return Err(AssemblyError::DeliberationFloorNotElapsed {
                until: session.deliberation_floor_end,
            });
        }

        self.ledger.append(EntryDraft::new(
            EntryType::SessionEvent,
            "presiding_officer",
            session.proposer,
            json!({
                "event": "voting_opened",
                "session_id": id,
            }),
        ))?;

        session.phase = SessionPhase::Voting;
        info!(session = %id, "voting opened");
        Ok(session.clone())
    }

    /// Cast a vote. Voting phase only.
    ///
    /// A vote without a stated basis is rejected before being counted. A
    /// member recasting overwrites their earlier vote; both casts remain
    /// on the ledger, only the latest is counted.
    pub fn cast_vote_at(
        &self,
        id: SessionId,
        member_id: MemberId,
        choice: VoteChoice,
        basis: Citation,
        now: DateTime<Utc>,
    ) -> Result<Vote, AssemblyError> {
        basis.validate()?;

        let member = self.directory.member(member_id)?;
        if !member.is_constitutionally_instantiated() {
            return Err(AssemblyError::VoterNotInstantiated(member_id));
        }

        let mut sessions = self.sessions.write().map_err(|_| AssemblyError::LockPoisoned)?;
        let session = sessions.get_mut(&id).ok_or(AssemblyError::SessionNotFound(id))?;
        require_phase(session, SessionPhase::Voting)?;

        let entry = self.ledger.append(EntryDraft::new(
            EntryType::Vote,
            member.role.as_deref().unwrap_or("member"),
            member_id,
            json!({
                "event": "vote_cast",
                "session_id": id,
                "choice": choice,
                "constitutional_basis": basis,
                "supersedes_earlier_vote": session.votes.contains_key(&member_id),
            }),
        ))?;

        let vote = Vote {
            member_id,
            choice,
            constitutional_basis: basis,
            cast_at: now,
            entry: entry.sequence_number,
        };
        session.votes.insert(member_id, vote.clone());

        info!(session = %id, member = %member_id, choice = %choice, "vote cast");
        Ok(vote)
    }

    /// Close the session: quorum, tally, record.
    ///
    /// On [`AssemblyError::QuorumNotMet`] the session remains open in the
    /// voting phase. Otherwise the outcome is decided, the record entry is
    /// written, and the session is closed - a deadlock closes it too; the
    /// matter is re-convened with a new session.
    pub fn close_session_at(
        &self,
        id: SessionId,
        now: DateTime<Utc>,
    ) -> Result<DeliberativeSession, AssemblyError> {
        let mut sessions = self.sessions.write().map_err(|_| AssemblyError::LockPoisoned)?;
        let session = sessions.get_mut(&id).ok_or(AssemblyError::SessionNotFound(id))?;
        require_phase(session, SessionPhase::Voting)?;

        self.check_quorum(session)?;

        let tally = session.tally_votes();
        let outcome = self.decide(session, &tally)?;

        let vote_entries: BTreeMap<String, u64> = session
            .votes
            .values()
            .map(|v| (v.member_id.to_string(), v.entry))
            .collect();

        // The session mutates only after every entry is on the record; a
        // failed append leaves it open in the voting phase for a retry.
        let record = self.ledger.append(EntryDraft::new(
            EntryType::SessionEvent,
            "presiding_officer",
            session.proposer,
            json!({
                "event": "session_record",
                "session_id": id,
                "session_number": session.number,
                "matter": session.matter,
                "outcome": outcome,
                "tally": tally,
                "vote_entries": vote_entries,
            }),
        ))?;

        let mut effective = None;
        if outcome == SessionOutcome::Passed && session.requires_supermajority {
            let instant = now + self.orders.amendment_waiting_period();

            self.ledger.append(EntryDraft::new(
                EntryType::Amendment,
                "presiding_officer",
                session.proposer,
                json!({
                    "event": "amendment_ratified",
                    "session_id": id,
                    "matter": session.matter,
                    "record_entry": record.sequence_number,
                    "pending_effective_at": instant,
                }),
            ))?;
            effective = Some(instant);
        }

        session.phase = SessionPhase::Record;
        session.outcome = Some(outcome);
        session.tally = Some(tally);
        session.record_entry = Some(record.sequence_number);
        session.closed_at = Some(now);
        session.pending_effective_at = effective;
        session.phase = SessionPhase::Closed;

        info!(
            session = %id,
            outcome = ?outcome,
            ayes = tally.ayes,
            nays = tally.nays,
            abstentions = tally.abstentions,
            "session closed"
        );
        Ok(session.clone())
    }

    /// Founding Era quorum: the founder and at least one constitutionally
    /// instantiated artificial member must each have voted - any choice,
    /// an abstention counts as participation.
    fn check_quorum(&self, session: &DeliberativeSession) -> Result<(), AssemblyError> {
        if !self.orders.founding_era {
            // Post-founding quorum: more than half the admitted membership.
            let admitted = self.directory.all()?.len() as u64;
            let voted = session.votes.len() as u64;
            if voted * 2 <= admitted {
                return Err(AssemblyError::QuorumNotMet(format!(
                    "{voted} of {admitted} members voted"
                )));
            }
            return Ok(());
        }

        let mut founder_voted = false;
        let mut artificial_voted = false;
        for member_id in session.votes.keys() {
            let member = self.directory.member(*member_id)?;
            founder_voted |= member.is_founder();
            artificial_voted |= member.member_type == MemberType::Artificial
                && member.is_constitutionally_instantiated();
        }

        if !founder_voted {
            return Err(AssemblyError::QuorumNotMet("founder has not voted".into()));
        }
        if !artificial_voted {
            return Err(AssemblyError::QuorumNotMet(
                "no constitutionally instantiated artificial member has voted".into(),
            ));
        }
        Ok(())
    }

    fn decide(
        &self,
        session: &DeliberativeSession,
        tally: &Tally,
    ) -> Result<SessionOutcome, AssemblyError> {
        let decided = tally.decided();
        if decided == 0 {
            return Ok(SessionOutcome::Deadlocked);
        }

        if session.requires_supermajority {
            // Two-thirds of the non-abstaining votes; the casting vote does
            // not apply to amendment matters.
            return Ok(if tally.ayes * 3 >= decided * 2 {
                SessionOutcome::Passed
            } else {
                SessionOutcome::Failed
            });
        }

        if tally.ayes * 2 > decided {
            return Ok(SessionOutcome::Passed);
        }
        if tally.nays * 2 > decided {
            return Ok(SessionOutcome::Failed);
        }

        // Exact tie. During the Founding Era the founder's aye or nay
        // breaks it; a founder abstention or absence leaves the matter
        // undecided.
        if self.orders.founding_era {
            let founder_choice = session.votes.values().find_map(|vote| {
                let member = self.directory.member(vote.member_id).ok()?;
                member.is_founder().then_some(vote.choice)
            });
            match founder_choice {
                Some(VoteChoice::Aye) => return Ok(SessionOutcome::Passed),
                Some(VoteChoice::Nay) => return Ok(SessionOutcome::Failed),
                _ => {}
            }
        }
        Ok(SessionOutcome::Deadlocked)
    }
}

fn require_phase(
    session: &DeliberativeSession,
    expected: SessionPhase,
) -> Result<(), AssemblyError> {
    if session.phase != expected {
        return Err(AssemblyError::WrongPhase {
            id: session.id,
            phase: session.phase,
            expected,
        });
    }
    Ok(())
}
