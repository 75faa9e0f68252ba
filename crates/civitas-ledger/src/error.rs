use thiserror::Error;

use crate::entry::EntryHash;

/// Errors from ledger operations.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LedgerError {
    /// Another append won the race for the expected chain tip. Recoverable:
    /// re-read the tip and retry.
    #[error("concurrent append conflict: expected tip {expected}, chain tip is {actual}")]
    ConcurrentAppendConflict {
        expected: EntryHash,
        actual: EntryHash,
    },

    /// A stored entry does not match its recomputed hash or its link to the
    /// previous entry. Fatal to trust in the affected range; surfaced,
    /// never auto-corrected.
    #[error("chain integrity violation at seq {sequence_number}: {reason} (stored {stored}, computed {computed})")]
    ChainIntegrityViolation {
        sequence_number: u64,
        stored: EntryHash,
        computed: EntryHash,
        reason: String,
    },

    #[error("invalid range: {from}..={to}")]
    InvalidRange { from: u64, to: u64 },

    /// A correction entry must reference the sequence number it supersedes.
    #[error("correction entry does not reference a superseded sequence number")]
    CorrectionWithoutTarget,

    /// `supersedes` must point at an entry already in the chain.
    #[error("supersedes target {0} is not in the chain")]
    SupersedesUnknownEntry(u64),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("ledger lock poisoned")]
    LockPoisoned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_error_names_both_tips() {
        let err = LedgerError::ConcurrentAppendConflict {
            expected: EntryHash([1; 32]),
            actual: EntryHash([2; 32]),
        };
        let text = err.to_string();
        assert!(text.contains("expected tip"));
        assert!(text.contains(&EntryHash([2; 32]).to_string()));
    }
}
