//! Constitutional citations.
//!
//! Every vote, notice, and override must cite the authority under which it
//! acts. Citation text is produced outside the kernel; the kernel treats it
//! as opaque and only enforces that the required parts are present.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A citation of constitutional or legislative authority.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Provision reference, e.g. "Article VIII §2" or "Amendment III".
    pub provision: String,
    /// Excerpt of the cited text.
    pub excerpt: String,
    /// Why this provision authorizes or constrains the action.
    pub relevance: String,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CitationError {
    #[error("citation missing provision reference")]
    MissingProvision,

    #[error("citation missing text excerpt")]
    MissingExcerpt,
}

impl Citation {
    pub fn new(
        provision: impl Into<String>,
        excerpt: impl Into<String>,
        relevance: impl Into<String>,
    ) -> Self {
        Self {
            provision: provision.into(),
            excerpt: excerpt.into(),
            relevance: relevance.into(),
        }
    }

    /// Check that the citation states an authority.
    ///
    /// Semantic correctness is out of scope; a stated provision and a
    /// non-empty excerpt are required before the citation is accepted.
    pub fn validate(&self) -> Result<(), CitationError> {
        if self.provision.trim().is_empty() {
            return Err(CitationError::MissingProvision);
        }
        if self.excerpt.trim().is_empty() {
            return Err(CitationError::MissingExcerpt);
        }
        Ok(())
    }
}

impl std::fmt::Display for Citation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.provision)
    }
}
