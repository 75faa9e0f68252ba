//! Notices and their lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use civitas_types::{Citation, MemberId, NoticeId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeStatus {
    Pending,
    Responded,
    Withdrawn,
    Enforced,
}

impl std::fmt::Display for NoticeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoticeStatus::Pending => write!(f, "pending"),
            NoticeStatus::Responded => write!(f, "responded"),
            NoticeStatus::Withdrawn => write!(f, "withdrawn"),
            NoticeStatus::Enforced => write!(f, "enforced"),
        }
    }
}

/// A due-process notice of an intended restrictive action.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Notice {
    pub id: NoticeId,
    pub subject_member_id: MemberId,
    pub issued_by_role: String,
    /// The constitutional authority under which the action is proposed.
    pub basis: Citation,
    pub issued_at: DateTime<Utc>,
    /// `issued_at + response period`, or `issued_at` itself for a notice
    /// issued under active emergency powers.
    pub response_deadline: DateTime<Utc>,
    /// Whether emergency powers were active at issue time.
    pub emergency: bool,
    pub status: NoticeStatus,
    pub response: Option<String>,
}

impl Notice {
    /// The enforcement gate.
    ///
    /// True iff the response window has lapsed or the notice was issued
    /// under emergency powers. A recorded response changes nothing here:
    /// it is held for review, not a veto, and not an accelerant.
    pub fn can_enforce_at(&self, now: DateTime<Utc>) -> bool {
        self.emergency || now >= self.response_deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn notice(emergency: bool) -> Notice {
        let issued_at = Utc::now();
        let deadline = if emergency {
            issued_at
        } else {
            issued_at + Duration::hours(48)
        };
        Notice {
            id: NoticeId::generate(),
            subject_member_id: MemberId::generate(),
            issued_by_role: "operations_executive".into(),
            basis: Citation::new("Article VI §1", "notice before restriction", "due process"),
            issued_at,
            response_deadline: deadline,
            emergency,
            status: NoticeStatus::Pending,
            response: None,
        }
    }

    #[test]
    fn gate_opens_only_after_the_deadline() {
        let n = notice(false);
        assert!(!n.can_enforce_at(n.issued_at));
        assert!(!n.can_enforce_at(n.issued_at + Duration::hours(47)));
        assert!(n.can_enforce_at(n.issued_at + Duration::hours(48)));
    }

    #[test]
    fn emergency_notice_is_enforceable_immediately() {
        let n = notice(true);
        assert!(n.can_enforce_at(n.issued_at));
    }

    #[test]
    fn a_response_does_not_move_the_gate() {
        let mut n = notice(false);
        n.status = NoticeStatus::Responded;
        n.response = Some("I contest the basis".into());
        assert!(!n.can_enforce_at(n.issued_at + Duration::hours(1)));
        assert!(n.can_enforce_at(n.issued_at + Duration::hours(49)));
    }
}
