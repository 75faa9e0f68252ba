//! # civitas-authority
//!
//! The permission engine and member directory.
//!
//! [`check_permission`] is a pure decision function over a member, an action
//! request, and the tier table: no hidden state, fully deterministic,
//! side-effect-free. Its outcomes are classifications, not errors - a
//! non-allowed decision carries the reason so the caller can escalate it to
//! the assembly or a judicial review path; the engine never silently drops
//! a request.
//!
//! [`MemberDirectory`] is the ledger-backed registry of members. Admission
//! writes a `Membership` entry, and artificial members are admitted only
//! when they satisfy every instantiation criterion.

pub mod directory;
pub mod engine;
pub mod error;

pub use directory::MemberDirectory;
pub use engine::{check_permission, ActionRequest, PermissionDecision};
pub use error::AuthorityError;
