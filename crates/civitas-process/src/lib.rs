//! # civitas-process
//!
//! Due process: notices, response windows, and the enforcement gate.
//!
//! A restrictive action against a member may be enforced only after the
//! subject's response window has lapsed, or immediately when the notice was
//! issued under active emergency powers. The window guarantees the
//! opportunity to respond - a recorded response is neither a veto nor an
//! accelerant, and enforcement callers must re-check the gate immediately
//! before every attempt.

pub mod desk;
pub mod error;
pub mod notice;

pub use desk::DueProcessDesk;
pub use error::ProcessError;
pub use notice::{Notice, NoticeStatus};
