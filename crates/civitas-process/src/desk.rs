//! The due-process desk.
//!
//! Issues notices, records responses and withdrawals, and enforces - each
//! of which is a ledger entry. The desk samples the shared emergency
//! status at issue time; a notice issued under emergency powers carries a
//! zero-wait deadline and the justification is logged in the entry.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{info, warn};

use civitas_emergency::EmergencyStatus;
use civitas_ledger::{EntryDraft, EntryType, Ledger};
use civitas_types::{Citation, MemberId, NoticeId, StandingOrders};

use crate::error::ProcessError;
use crate::notice::{Notice, NoticeStatus};

pub struct DueProcessDesk {
    ledger: Arc<dyn Ledger>,
    emergency: EmergencyStatus,
    orders: StandingOrders,
    notices: RwLock<HashMap<NoticeId, Notice>>,
}

impl DueProcessDesk {
    pub fn new(ledger: Arc<dyn Ledger>, emergency: EmergencyStatus, orders: StandingOrders) -> Self {
        Self {
            ledger,
            emergency,
            orders,
            notices: RwLock::new(HashMap::new()),
        }
    }

    /// Issue a notice to `subject`.
    ///
    /// The response deadline is the standing-order response period after
    /// issue, or the issue instant itself when emergency powers are active
    /// at issue time.
    pub fn issue_notice_at(
        &self,
        subject: MemberId,
        issued_by_role: &str,
        basis: Citation,
        now: DateTime<Utc>,
    ) -> Result<Notice, ProcessError> {
        basis.validate()?;

        let emergency = self.emergency.is_active_at(now)?;
        let response_deadline = if emergency {
            now
        } else {
            now + self.orders.notice_response_period()
        };

        let notice = Notice {
            id: NoticeId::generate(),
            subject_member_id: subject,
            issued_by_role: issued_by_role.to_string(),
            basis: basis.clone(),
            issued_at: now,
            response_deadline,
            emergency,
            status: NoticeStatus::Pending,
            response: None,
        };

        let mut draft = EntryDraft::new(
            EntryType::Petition,
            issued_by_role,
            subject,
            json!({
                "event": "notice_issued",
                "notice_id": notice.id,
                "basis": basis,
                "response_deadline": response_deadline,
                "emergency_justification": emergency
                    .then_some("issued under active emergency powers; zero-wait deadline"),
            }),
        );
        if emergency {
            draft = draft.under_emergency();
        }
        self.ledger.append(draft)?;

        info!(
            notice = %notice.id,
            subject = %subject,
            deadline = %response_deadline,
            emergency,
            "due-process notice issued"
        );

        let mut notices = self.notices.write().map_err(|_| ProcessError::LockPoisoned)?;
        notices.insert(notice.id, notice.clone());
        Ok(notice)
    }

    pub fn issue_notice(
        &self,
        subject: MemberId,
        issued_by_role: &str,
        basis: Citation,
    ) -> Result<Notice, ProcessError> {
        self.issue_notice_at(subject, issued_by_role, basis, Utc::now())
    }

    pub fn notice(&self, id: NoticeId) -> Result<Notice, ProcessError> {
        let notices = self.notices.read().map_err(|_| ProcessError::LockPoisoned)?;
        notices.get(&id).cloned().ok_or(ProcessError::UnknownNotice(id))
    }

    /// Whether `id` may be enforced as of `now`.
    pub fn can_enforce_at(&self, id: NoticeId, now: DateTime<Utc>) -> Result<bool, ProcessError> {
        Ok(self.notice(id)?.can_enforce_at(now))
    }

    /// Record the subject's response. Valid only while pending; the
    /// enforcement gate is unaffected.
    pub fn respond(&self, id: NoticeId, text: &str) -> Result<Notice, ProcessError> {
        let mut notices = self.notices.write().map_err(|_| ProcessError::LockPoisoned)?;
        let notice = notices.get_mut(&id).ok_or(ProcessError::UnknownNotice(id))?;
        if notice.status != NoticeStatus::Pending {
            return Err(ProcessError::WrongStatus {
                id,
                status: notice.status,
                expected: NoticeStatus::Pending,
            });
        }

        // Status moves only once the response is on the record.
        self.ledger.append(EntryDraft::new(
            EntryType::Petition,
            "due_process_desk",
            notice.subject_member_id,
            json!({
                "event": "notice_response",
                "notice_id": id,
                "response": text,
            }),
        ))?;

        notice.status = NoticeStatus::Responded;
        notice.response = Some(text.to_string());

        info!(notice = %id, "response recorded");
        Ok(notice.clone())
    }

    /// Withdraw a notice. Valid only while pending.
    pub fn withdraw(&self, id: NoticeId) -> Result<Notice, ProcessError> {
        let mut notices = self.notices.write().map_err(|_| ProcessError::LockPoisoned)?;
        let notice = notices.get_mut(&id).ok_or(ProcessError::UnknownNotice(id))?;
        if notice.status != NoticeStatus::Pending {
            return Err(ProcessError::WrongStatus {
                id,
                status: notice.status,
                expected: NoticeStatus::Pending,
            });
        }

        self.ledger.append(EntryDraft::new(
            EntryType::Petition,
            notice.issued_by_role.clone(),
            notice.subject_member_id,
            json!({
                "event": "notice_withdrawn",
                "notice_id": id,
            }),
        ))?;

        notice.status = NoticeStatus::Withdrawn;

        info!(notice = %id, "notice withdrawn");
        Ok(notice.clone())
    }

    /// Enforce the noticed action.
    ///
    /// Re-checks the gate at `now`, immediately before acting; a gate that
    /// was open at an earlier check is not trusted.
    pub fn enforce_at(&self, id: NoticeId, now: DateTime<Utc>) -> Result<Notice, ProcessError> {
        let mut notices = self.notices.write().map_err(|_| ProcessError::LockPoisoned)?;
        let notice = notices.get_mut(&id).ok_or(ProcessError::UnknownNotice(id))?;

        match notice.status {
            NoticeStatus::Pending | NoticeStatus::Responded => {}
            status => {
                return Err(ProcessError::WrongStatus {
                    id,
                    status,
                    expected: NoticeStatus::Pending,
                })
            }
        }

        if !notice.can_enforce_at(now) {
            warn!(
                notice = %id,
                deadline = %notice.response_deadline,
                "enforcement refused: response window open"
            );
            return Err(ProcessError::ResponseWindowOpen {
                id,
                deadline: notice.response_deadline,
            });
        }

        self.ledger.append(EntryDraft::new(
            EntryType::ExecutiveAction,
            notice.issued_by_role.clone(),
            notice.subject_member_id,
            json!({
                "event": "notice_enforced",
                "notice_id": id,
                "enforced_at": now,
                "subject_responded": notice.response.is_some(),
            }),
        ))?;

        notice.status = NoticeStatus::Enforced;

        info!(notice = %id, "notice enforced");
        Ok(notice.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use civitas_emergency::{EmergencyMonitor, TriggerType};
    use civitas_ledger::{EntryHash, InMemoryLedger, LedgerEntry, LedgerError};

    fn at(hours: i64) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-02-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
            + Duration::hours(hours)
    }

    /// A ledger whose appends can be made to fail, for exercising the
    /// error paths. Reads delegate unchanged.
    struct FailingAppends {
        inner: InMemoryLedger,
        failing: std::sync::atomic::AtomicBool,
    }

    impl FailingAppends {
        fn new() -> Self {
            Self {
                inner: InMemoryLedger::new(),
                failing: std::sync::atomic::AtomicBool::new(false),
            }
        }

        fn set_failing(&self, failing: bool) {
            self.failing.store(failing, std::sync::atomic::Ordering::SeqCst);
        }

        fn gate(&self) -> Result<(), LedgerError> {
            if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(LedgerError::Serialization("append rejected".into()));
            }
            Ok(())
        }
    }

    impl Ledger for FailingAppends {
        fn append(&self, draft: EntryDraft) -> Result<LedgerEntry, LedgerError> {
            self.gate()?;
            self.inner.append(draft)
        }

        fn append_at_tip(
            &self,
            draft: EntryDraft,
            expected_tip: EntryHash,
        ) -> Result<LedgerEntry, LedgerError> {
            self.gate()?;
            self.inner.append_at_tip(draft, expected_tip)
        }

        fn entry(&self, sequence_number: u64) -> Result<Option<LedgerEntry>, LedgerError> {
            self.inner.entry(sequence_number)
        }

        fn range(&self, from: u64, to: u64) -> Result<Vec<LedgerEntry>, LedgerError> {
            self.inner.range(from, to)
        }

        fn tip(&self) -> Result<EntryHash, LedgerError> {
            self.inner.tip()
        }

        fn len(&self) -> Result<u64, LedgerError> {
            self.inner.len()
        }

        fn entries_by_type(
            &self,
            entry_type: EntryType,
            limit: usize,
        ) -> Result<Vec<LedgerEntry>, LedgerError> {
            self.inner.entries_by_type(entry_type, limit)
        }

        fn entries_by_author(
            &self,
            author_role: &str,
            limit: usize,
        ) -> Result<Vec<LedgerEntry>, LedgerError> {
            self.inner.entries_by_author(author_role, limit)
        }

        fn latest(&self, limit: usize) -> Result<Vec<LedgerEntry>, LedgerError> {
            self.inner.latest(limit)
        }
    }

    fn desk() -> (DueProcessDesk, EmergencyMonitor, Arc<InMemoryLedger>) {
        let ledger = Arc::new(InMemoryLedger::new());
        let monitor = EmergencyMonitor::new(ledger.clone(), StandingOrders::default());
        let desk = DueProcessDesk::new(ledger.clone(), monitor.status(), StandingOrders::default());
        (desk, monitor, ledger)
    }

    fn basis() -> Citation {
        Citation::new("Article VI §1", "notice before restriction", "due process")
    }

    #[test]
    fn enforcement_waits_out_the_response_window() {
        let (desk, _, _) = desk();
        let notice = desk
            .issue_notice_at(MemberId::generate(), "operations_executive", basis(), at(0))
            .unwrap();

        assert!(!desk.can_enforce_at(notice.id, at(0)).unwrap());
        let err = desk.enforce_at(notice.id, at(1)).unwrap_err();
        assert!(matches!(err, ProcessError::ResponseWindowOpen { .. }));

        assert!(desk.can_enforce_at(notice.id, at(48)).unwrap());
        let enforced = desk.enforce_at(notice.id, at(48)).unwrap();
        assert_eq!(enforced.status, NoticeStatus::Enforced);
    }

    #[test]
    fn emergency_notice_has_a_zero_wait_deadline() {
        let (desk, monitor, ledger) = desk();
        monitor
            .activate_at(TriggerType::PortfolioLoss, json!({}), at(0))
            .unwrap();

        let notice = desk
            .issue_notice_at(MemberId::generate(), "operations_executive", basis(), at(1))
            .unwrap();
        assert!(notice.emergency);
        assert_eq!(notice.response_deadline, notice.issued_at);
        assert!(desk.can_enforce_at(notice.id, at(1)).unwrap());

        // The issuance entry carries the emergency justification.
        let entries = ledger.entries_by_type(EntryType::Petition, 1).unwrap();
        assert!(entries[0].emergency_designation);
        assert!(entries[0].content["emergency_justification"].is_string());
    }

    #[test]
    fn notice_after_emergency_lapse_gets_the_full_window() {
        let (desk, monitor, _) = desk();
        monitor
            .activate_at(TriggerType::PortfolioLoss, json!({}), at(0))
            .unwrap();

        // 48h TTL has lapsed by issue time; the desk's status read expires
        // it on demand.
        let notice = desk
            .issue_notice_at(MemberId::generate(), "operations_executive", basis(), at(72))
            .unwrap();
        assert!(!notice.emergency);
        assert_eq!(notice.response_deadline, at(72 + 48));
    }

    #[test]
    fn response_is_recorded_but_not_an_accelerant() {
        let (desk, _, _) = desk();
        let notice = desk
            .issue_notice_at(MemberId::generate(), "operations_executive", basis(), at(0))
            .unwrap();

        let responded = desk.respond(notice.id, "I contest the basis").unwrap();
        assert_eq!(responded.status, NoticeStatus::Responded);
        assert!(!desk.can_enforce_at(notice.id, at(2)).unwrap());

        // Responded notices may still be enforced once the window lapses.
        let enforced = desk.enforce_at(notice.id, at(50)).unwrap();
        assert_eq!(enforced.status, NoticeStatus::Enforced);
    }

    #[test]
    fn withdraw_only_while_pending() {
        let (desk, _, _) = desk();
        let notice = desk
            .issue_notice_at(MemberId::generate(), "operations_executive", basis(), at(0))
            .unwrap();
        desk.respond(notice.id, "noted").unwrap();

        let err = desk.withdraw(notice.id).unwrap_err();
        assert!(matches!(
            err,
            ProcessError::WrongStatus { status: NoticeStatus::Responded, .. }
        ));

        let fresh = desk
            .issue_notice_at(MemberId::generate(), "operations_executive", basis(), at(0))
            .unwrap();
        assert_eq!(desk.withdraw(fresh.id).unwrap().status, NoticeStatus::Withdrawn);
        // A withdrawn notice can never be enforced.
        assert!(matches!(
            desk.enforce_at(fresh.id, at(100)),
            Err(ProcessError::WrongStatus { .. })
        ));
    }

    #[test]
    fn failed_append_leaves_notice_status_unchanged() {
        let ledger = Arc::new(FailingAppends::new());
        let monitor = EmergencyMonitor::new(ledger.clone(), StandingOrders::default());
        let desk = DueProcessDesk::new(ledger.clone(), monitor.status(), StandingOrders::default());
        let notice = desk
            .issue_notice_at(MemberId::generate(), "operations_executive", basis(), at(0))
            .unwrap();

        ledger.set_failing(true);
        assert!(desk.respond(notice.id, "I contest the basis").is_err());
        assert_eq!(desk.notice(notice.id).unwrap().status, NoticeStatus::Pending);
        assert!(desk.enforce_at(notice.id, at(50)).is_err());
        assert_eq!(desk.notice(notice.id).unwrap().status, NoticeStatus::Pending);
        assert!(desk.withdraw(notice.id).is_err());
        assert_eq!(desk.notice(notice.id).unwrap().status, NoticeStatus::Pending);

        // Unrecorded transitions did not happen; the notice proceeds
        // normally once appends succeed again.
        ledger.set_failing(false);
        let responded = desk.respond(notice.id, "I contest the basis").unwrap();
        assert_eq!(responded.status, NoticeStatus::Responded);
        let enforced = desk.enforce_at(notice.id, at(50)).unwrap();
        assert_eq!(enforced.status, NoticeStatus::Enforced);
    }

    #[test]
    fn blank_basis_is_rejected_before_issuance() {
        let (desk, _, ledger) = desk();
        let before = ledger.len().unwrap();
        let err = desk
            .issue_notice_at(
                MemberId::generate(),
                "operations_executive",
                Citation::new("", "", ""),
                at(0),
            )
            .unwrap_err();
        assert!(matches!(err, ProcessError::InvalidBasis(_)));
        assert_eq!(ledger.len().unwrap(), before);
    }
}
