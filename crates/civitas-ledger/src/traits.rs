//! The ledger contract.

use crate::entry::{verify_entries, EntryDraft, EntryHash, EntryType, LedgerEntry, VerificationReport};
use crate::error::LedgerError;

/// The append-only institutional record.
///
/// `append` is the system's single serialization point: implementations
/// must linearize concurrent appends (one writer at a time, or a
/// compare-and-swap on the chain tip). An append either completes and is
/// visible or fails with no partial write. All reads are side-effect-free,
/// run against a consistent snapshot, and carry no authorization gate -
/// the record is open to every member.
pub trait Ledger: Send + Sync {
    /// Append a draft, assigning the next sequence number and linking it to
    /// the current chain tip.
    fn append(&self, draft: EntryDraft) -> Result<LedgerEntry, LedgerError>;

    /// Optimistic append: fails with
    /// [`LedgerError::ConcurrentAppendConflict`] if the chain tip is no
    /// longer `expected_tip`. The caller re-reads the tip and retries.
    fn append_at_tip(
        &self,
        draft: EntryDraft,
        expected_tip: EntryHash,
    ) -> Result<LedgerEntry, LedgerError>;

    /// Read a single entry by sequence number.
    fn entry(&self, sequence_number: u64) -> Result<Option<LedgerEntry>, LedgerError>;

    /// Read the inclusive range `from..=to`, ordered by sequence number.
    fn range(&self, from: u64, to: u64) -> Result<Vec<LedgerEntry>, LedgerError>;

    /// Hash of the most recent entry.
    fn tip(&self) -> Result<EntryHash, LedgerError>;

    /// Number of entries in the chain, genesis included.
    fn len(&self) -> Result<u64, LedgerError>;

    fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.len()? == 0)
    }

    /// Most recent entries of a given type, newest first.
    fn entries_by_type(
        &self,
        entry_type: EntryType,
        limit: usize,
    ) -> Result<Vec<LedgerEntry>, LedgerError>;

    /// Most recent entries by author role, newest first.
    fn entries_by_author(&self, author_role: &str, limit: usize)
        -> Result<Vec<LedgerEntry>, LedgerError>;

    /// Most recent entries of any type, newest first.
    fn latest(&self, limit: usize) -> Result<Vec<LedgerEntry>, LedgerError>;

    /// Recompute and check every hash in `from..=to`.
    ///
    /// Surfaces the first mismatching sequence number with both hashes.
    /// Never auto-corrects anything.
    fn verify(&self, from: u64, to: u64) -> Result<VerificationReport, LedgerError> {
        let entries = self.range(from, to)?;
        verify_entries(&entries)
    }
}
