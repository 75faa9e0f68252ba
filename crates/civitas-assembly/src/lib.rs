//! # civitas-assembly
//!
//! The deliberative cycle: sessions move strictly forward through
//! `Opening → Deliberation → Voting → Record → Closed`, every transition
//! is a ledger entry, and the permission engine decides who has standing
//! to propose.
//!
//! The deliberation floor is set once, at open time, from the emergency
//! status in force at that instant. It may be compressed by an active
//! emergency, never eliminated, and never changed retroactively for a
//! session already open.

pub mod error;
pub mod manager;
pub mod session;

pub use error::AssemblyError;
pub use manager::CycleManager;
pub use session::{
    DeliberativeSession, SessionOutcome, SessionPhase, Submission, Tally, Vote,
};
