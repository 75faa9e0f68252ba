//! # civitas-ledger
//!
//! The append-only, hash-chained institutional record - the sole source of
//! truth for the Civitas governance kernel. Every phase transition, vote,
//! permission escalation, and emergency activation elsewhere in the system
//! is a write here, and the chain's integrity guarantees are what make
//! those components' claims checkable.
//!
//! Three properties hold at this layer:
//!
//! - **Cryptographically verifiable** - each entry hashes its predecessor's
//!   hash together with its own canonical encoding; any retroactive edit is
//!   detectable by recomputation.
//! - **Append-only** - there is no update and no delete. Corrections are
//!   new entries of type [`EntryType::Correction`] pointing at the
//!   superseded sequence number; the original is retained.
//! - **Independently auditable** - [`verify_entries`] needs only the raw
//!   entries and the hash function, no privileged state. The
//!   `civitas-audit` binary is exactly that, with zero write privileges.

pub mod entry;
pub mod error;
pub mod memory;
pub mod traits;

pub use entry::{
    compute_entry_hash, verify_entries, EntryDraft, EntryHash, EntryType, LedgerEntry,
    VerificationReport, GENESIS_HASH,
};
pub use error::LedgerError;
pub use memory::InMemoryLedger;
pub use traits::Ledger;
