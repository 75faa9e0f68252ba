//! Permission tiers and action classes.
//!
//! Authority is table-driven: each tier names the highest action class it
//! covers, a soft review threshold, and a hard irreversible-action
//! threshold. The decision function over this table lives in
//! `civitas-authority`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Classes of institutional action, ordered from least to most consequential.
///
/// A tier whose `max_action_class` is `Operational` covers `Custodial`,
/// `Advisory`, and `Operational` actions and nothing above them.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ActionClass {
    /// Ledger writes and chain verification.
    Custodial,
    /// Interpretation, opinions, audits.
    Advisory,
    /// Routine operations, coordination, session management.
    Operational,
    /// Portfolio trades and rebalancing.
    Trading,
    /// Monetary directives and allocation adjustments.
    Monetary,
}

/// Ordinal tier levels. `Founder` sits above the numbered tiers and is the
/// only level whose tier may carry the override privilege.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TierLevel {
    Tier(u8),
    Founder,
}

impl std::fmt::Display for TierLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TierLevel::Tier(n) => write!(f, "tier-{n}"),
            TierLevel::Founder => write!(f, "founder"),
        }
    }
}

/// A permission tier definition.
///
/// Tiers are established by legislative standing order and recorded in the
/// ledger; this struct is the in-memory form the permission engine reads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PermissionTier {
    pub level: TierLevel,
    pub name: String,
    /// Highest action class this tier covers. Anything above is forbidden.
    pub max_action_class: ActionClass,
    /// Magnitude (fraction of portfolio) above which an otherwise covered
    /// action requires prior approval. `None` means no soft gate.
    pub review_threshold: Option<f64>,
    /// Magnitude above which an irreversible action is refused outright.
    /// `None` means irreversible actions are refused at any magnitude.
    pub irreversible_threshold: Option<f64>,
    /// Whether this tier may override the irreversible threshold with an
    /// explicit recorded citation. True only for the founder tier.
    pub can_override: bool,
}

/// The Founding Era tier table.
///
/// Established by the founding standing orders; replaced at runtime by
/// whatever tier table later standing orders record.
pub fn founding_tiers() -> BTreeMap<TierLevel, PermissionTier> {
    let mut tiers = BTreeMap::new();
    tiers.insert(
        TierLevel::Tier(0),
        PermissionTier {
            level: TierLevel::Tier(0),
            name: "Custodial".into(),
            max_action_class: ActionClass::Custodial,
            review_threshold: None,
            irreversible_threshold: None,
            can_override: false,
        },
    );
    tiers.insert(
        TierLevel::Tier(1),
        PermissionTier {
            level: TierLevel::Tier(1),
            name: "Advisory".into(),
            max_action_class: ActionClass::Advisory,
            review_threshold: None,
            irreversible_threshold: None,
            can_override: false,
        },
    );
    tiers.insert(
        TierLevel::Tier(2),
        PermissionTier {
            level: TierLevel::Tier(2),
            name: "Operational".into(),
            max_action_class: ActionClass::Operational,
            review_threshold: Some(0.05),
            irreversible_threshold: Some(0.05),
            can_override: false,
        },
    );
    tiers.insert(
        TierLevel::Tier(3),
        PermissionTier {
            level: TierLevel::Tier(3),
            name: "Portfolio".into(),
            max_action_class: ActionClass::Trading,
            review_threshold: Some(0.10),
            irreversible_threshold: Some(0.15),
            can_override: false,
        },
    );
    tiers.insert(
        TierLevel::Tier(4),
        PermissionTier {
            level: TierLevel::Tier(4),
            name: "Monetary".into(),
            max_action_class: ActionClass::Monetary,
            review_threshold: Some(0.20),
            irreversible_threshold: Some(0.20),
            can_override: false,
        },
    );
    tiers.insert(
        TierLevel::Founder,
        PermissionTier {
            level: TierLevel::Founder,
            name: "Founding Authority".into(),
            max_action_class: ActionClass::Monetary,
            review_threshold: None,
            irreversible_threshold: Some(0.25),
            can_override: true,
        },
    );
    tiers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_classes_are_ordered() {
        assert!(ActionClass::Custodial < ActionClass::Advisory);
        assert!(ActionClass::Trading < ActionClass::Monetary);
    }

    #[test]
    fn founder_sits_above_numbered_tiers() {
        assert!(TierLevel::Tier(4) < TierLevel::Founder);
    }

    #[test]
    fn only_founder_tier_can_override() {
        let tiers = founding_tiers();
        for (level, tier) in &tiers {
            assert_eq!(
                tier.can_override,
                *level == TierLevel::Founder,
                "override flag wrong for {level}"
            );
        }
    }
}
