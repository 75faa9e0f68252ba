//! The permission decision function.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use civitas_types::{ActionClass, Citation, Member, PermissionTier, TierLevel};

/// A requested institutional action, as presented to the engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionRequest {
    pub class: ActionClass,
    /// Magnitude as a fraction of portfolio, where applicable.
    pub magnitude: Option<f64>,
    /// Whether the action cannot be fully undone within a defined window.
    pub irreversible: bool,
    /// An explicit recorded justification for overriding the irreversible
    /// threshold. Honored only for a tier with the override privilege; the
    /// caller is responsible for recording it in the ledger.
    pub override_citation: Option<Citation>,
}

impl ActionRequest {
    pub fn new(class: ActionClass) -> Self {
        Self {
            class,
            magnitude: None,
            irreversible: false,
            override_citation: None,
        }
    }

    pub fn with_magnitude(mut self, magnitude: f64) -> Self {
        self.magnitude = Some(magnitude);
        self
    }

    pub fn irreversible(mut self) -> Self {
        self.irreversible = true;
        self
    }

    pub fn with_override_citation(mut self, citation: Citation) -> Self {
        self.override_citation = Some(citation);
        self
    }
}

/// The engine's classification of a request.
///
/// Callers branch on the decision; only `Allowed` proceeds directly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "decision")]
pub enum PermissionDecision {
    Allowed,
    /// Within the tier's class but above its soft review threshold:
    /// escalate to the assembly for prior approval.
    RequiresApproval { reason: String },
    Forbidden { reason: String },
    /// Irreversible and above the tier's hard threshold. Not overridable
    /// except by a tier holding the override privilege with an explicit
    /// recorded citation.
    ExceedsIrreversibleThreshold {
        magnitude: f64,
        threshold: Option<f64>,
    },
}

impl PermissionDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, PermissionDecision::Allowed)
    }
}

/// Decide whether `member` may take `request`.
///
/// Pure over the member, the request, and the tier table. Checks in order:
/// constitutional instantiation, action-class coverage, the irreversible
/// threshold (with the founder override path), then the soft review
/// threshold.
pub fn check_permission(
    member: &Member,
    request: &ActionRequest,
    tiers: &BTreeMap<TierLevel, PermissionTier>,
) -> PermissionDecision {
    if !member.is_constitutionally_instantiated() {
        return PermissionDecision::Forbidden {
            reason: format!(
                "member {} is not constitutionally instantiated",
                member.id
            ),
        };
    }

    let Some(tier) = tiers.get(&member.permission_tier) else {
        return PermissionDecision::Forbidden {
            reason: format!("no tier defined at level {}", member.permission_tier),
        };
    };

    if request.class > tier.max_action_class {
        return PermissionDecision::Forbidden {
            reason: format!(
                "{} tier covers at most {:?} actions, not {:?}",
                tier.name, tier.max_action_class, request.class
            ),
        };
    }

    let magnitude = request.magnitude.unwrap_or(0.0);

    if request.irreversible {
        let exceeded = match tier.irreversible_threshold {
            Some(threshold) => magnitude > threshold,
            // No threshold at this tier: irreversible actions are refused
            // at any magnitude.
            None => true,
        };
        if exceeded {
            let overridden = tier.can_override
                && request
                    .override_citation
                    .as_ref()
                    .is_some_and(|c| c.validate().is_ok());
            if !overridden {
                return PermissionDecision::ExceedsIrreversibleThreshold {
                    magnitude,
                    threshold: tier.irreversible_threshold,
                };
            }
        }
    }

    if let Some(review) = tier.review_threshold {
        if magnitude > review {
            return PermissionDecision::RequiresApproval {
                reason: format!(
                    "magnitude {magnitude:.4} exceeds {} review threshold {review:.4}",
                    tier.name
                ),
            };
        }
    }

    PermissionDecision::Allowed
}
