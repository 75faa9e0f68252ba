//! Ledger entries, canonical encoding, and chain verification.
//!
//! The hash rule is the single most safety-critical property of the whole
//! kernel: `entry_hash = blake3(PREFIX || previous_hash ||
//! canonical_json(hashable fields))`. Canonical encoding must be
//! deterministic across runs - struct fields serialize in declaration
//! order, and `serde_json`'s map type keeps object keys sorted - or
//! verification would be meaningless.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use civitas_types::MemberId;

use crate::error::LedgerError;

/// Domain-separation prefix for entry hashing.
const HASH_PREFIX: &[u8] = b"civitas-ledger-entry-v1:";

/// The fixed all-zero `previous_hash` of the genesis entry.
pub const GENESIS_HASH: EntryHash = EntryHash([0; 32]);

/// Types of ledger entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// The chain anchor. Exactly one, at sequence zero.
    Genesis,
    /// Session openings, phase transitions, deliberative submissions.
    SessionEvent,
    Vote,
    ExecutiveAction,
    Directive,
    Membership,
    Emergency,
    Amendment,
    Petition,
    AuditFinding,
    /// Supersedes an earlier entry without editing it.
    Correction,
}

/// A 32-byte blake3 entry hash, serialized as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryHash(pub [u8; 32]);

impl std::fmt::Display for EntryHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", blake3::Hash::from(self.0).to_hex())
    }
}

impl std::fmt::Debug for EntryHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EntryHash({})", self)
    }
}

impl Serialize for EntryHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EntryHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        let hash = blake3::Hash::from_hex(&hex)
            .map_err(|e| serde::de::Error::custom(format!("bad entry hash: {e}")))?;
        Ok(EntryHash(*hash.as_bytes()))
    }
}

/// What a caller submits for appending. Sequence number, timestamp, and
/// both hashes are assigned by the ledger at append time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntryDraft {
    pub entry_type: EntryType,
    /// Constitutional role identifier of the author.
    pub author_role: String,
    pub author_member_id: MemberId,
    /// Structured payload. Opaque to the ledger; schema is set by
    /// `entry_type`.
    pub content: Value,
    /// Sequence number of the entry this corrects. Required for
    /// [`EntryType::Correction`].
    pub supersedes: Option<u64>,
    /// Whether the entry was made under emergency powers.
    pub emergency_designation: bool,
}

impl EntryDraft {
    pub fn new(
        entry_type: EntryType,
        author_role: impl Into<String>,
        author_member_id: MemberId,
        content: Value,
    ) -> Self {
        Self {
            entry_type,
            author_role: author_role.into(),
            author_member_id,
            content,
            supersedes: None,
            emergency_designation: false,
        }
    }

    pub fn superseding(mut self, sequence_number: u64) -> Self {
        self.supersedes = Some(sequence_number);
        self
    }

    pub fn under_emergency(mut self) -> Self {
        self.emergency_designation = true;
        self
    }
}

/// A finalized, immutable ledger entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub sequence_number: u64,
    pub entry_type: EntryType,
    pub author_role: String,
    pub author_member_id: MemberId,
    pub content: Value,
    pub supersedes: Option<u64>,
    pub emergency_designation: bool,
    /// Monotonically non-decreasing with `sequence_number`.
    pub timestamp: DateTime<Utc>,
    pub previous_hash: EntryHash,
    pub entry_hash: EntryHash,
}

/// The hashed view of an entry: everything except the hashes themselves.
/// Field order here is the canonical field order.
#[derive(Serialize)]
struct HashableEntry<'a> {
    sequence_number: u64,
    entry_type: EntryType,
    author_role: &'a str,
    author_member_id: MemberId,
    content: &'a Value,
    supersedes: Option<u64>,
    emergency_designation: bool,
    timestamp: &'a DateTime<Utc>,
}

/// Compute the hash of an entry from its stored fields.
///
/// Any party holding the raw entry can recompute this; no privileged state
/// is involved.
pub fn compute_entry_hash(entry: &LedgerEntry) -> Result<EntryHash, LedgerError> {
    let hashable = HashableEntry {
        sequence_number: entry.sequence_number,
        entry_type: entry.entry_type,
        author_role: &entry.author_role,
        author_member_id: entry.author_member_id,
        content: &entry.content,
        supersedes: entry.supersedes,
        emergency_designation: entry.emergency_designation,
        timestamp: &entry.timestamp,
    };
    let canonical =
        serde_json::to_vec(&hashable).map_err(|e| LedgerError::Serialization(e.to_string()))?;

    let mut hasher = blake3::Hasher::new();
    hasher.update(HASH_PREFIX);
    hasher.update(&entry.previous_hash.0);
    hasher.update(&canonical);
    Ok(EntryHash(*hasher.finalize().as_bytes()))
}

/// Result of a successful verification pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub entries_verified: u64,
    /// Hash of the last entry in the verified range.
    pub tip_hash: EntryHash,
}

/// Verify a contiguous run of entries against the hash rule.
///
/// Checks, per entry: recomputed hash matches the stored hash; the
/// `previous_hash` links to the prior entry (or to [`GENESIS_HASH`] when the
/// run starts at sequence zero); sequence numbers are contiguous; and
/// timestamps never decrease. Returns the first violation found.
pub fn verify_entries(entries: &[LedgerEntry]) -> Result<VerificationReport, LedgerError> {
    let first = entries.first().ok_or(LedgerError::InvalidRange { from: 0, to: 0 })?;

    if first.sequence_number == 0 && first.previous_hash != GENESIS_HASH {
        return Err(integrity_error(first, first.previous_hash, "genesis previous_hash is not the zero hash"));
    }

    for (index, entry) in entries.iter().enumerate() {
        let expected_seq = first.sequence_number + index as u64;
        if entry.sequence_number != expected_seq {
            return Err(integrity_error(
                entry,
                entry.entry_hash,
                &format!("expected sequence {expected_seq}"),
            ));
        }

        if index > 0 {
            let prior = &entries[index - 1];
            if entry.previous_hash != prior.entry_hash {
                return Err(integrity_error(
                    entry,
                    prior.entry_hash,
                    "previous_hash does not match prior entry's hash",
                ));
            }
            if entry.timestamp < prior.timestamp {
                return Err(integrity_error(
                    entry,
                    entry.entry_hash,
                    "timestamp regresses below prior entry",
                ));
            }
        }

        let computed = compute_entry_hash(entry)?;
        if computed != entry.entry_hash {
            return Err(LedgerError::ChainIntegrityViolation {
                sequence_number: entry.sequence_number,
                stored: entry.entry_hash,
                computed,
                reason: "entry hash mismatch".into(),
            });
        }
    }

    let tip_hash = entries
        .last()
        .map(|e| e.entry_hash)
        .unwrap_or(first.entry_hash);
    Ok(VerificationReport {
        entries_verified: entries.len() as u64,
        tip_hash,
    })
}

fn integrity_error(entry: &LedgerEntry, computed: EntryHash, reason: &str) -> LedgerError {
    LedgerError::ChainIntegrityViolation {
        sequence_number: entry.sequence_number,
        stored: entry.entry_hash,
        computed,
        reason: reason.into(),
    }
}
