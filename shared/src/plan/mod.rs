//! Plan registry
//!
//! Maps every [`PlanTier`] to its [`PlanLimits`]. The table is a set of
//! immutable statics; lookup is a `match` and cannot fail.

mod limits;

pub use limits::{
    Feature, FeatureFlags, InvalidQuota, PlanLimits, Quota, QuotaKind, UNLIMITED,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Subscription tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    #[default]
    Free,
    Professional,
    Enterprise,
}

impl PlanTier {
    pub const ALL: [PlanTier; 3] = [PlanTier::Free, PlanTier::Professional, PlanTier::Enterprise];

    /// Parse from database / metadata string value (lowercase)
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "free" => Some(Self::Free),
            "professional" => Some(Self::Professional),
            "enterprise" => Some(Self::Enterprise),
            _ => None,
        }
    }

    /// Database string representation (lowercase)
    pub const fn as_db(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Professional => "professional",
            Self::Enterprise => "enterprise",
        }
    }

    /// Limits for this tier
    pub fn limits(&self) -> &'static PlanLimits {
        lookup(*self)
    }

    pub const fn is_paid(&self) -> bool {
        !matches!(self, Self::Free)
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db())
    }
}

/// Registry lookup
pub fn lookup(tier: PlanTier) -> &'static PlanLimits {
    match tier {
        PlanTier::Free => &limits::FREE,
        PlanTier::Professional => &limits::PROFESSIONAL,
        PlanTier::Enterprise => &limits::ENTERPRISE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tier_has_four_quotas_and_eight_flags() {
        for tier in PlanTier::ALL {
            let limits = lookup(tier);
            assert_eq!(QuotaKind::ALL.map(|k| limits.quota(k)).len(), 4);
            assert_eq!(limits.features.iter().count(), 8);
        }
    }

    #[test]
    fn free_tier_quotas() {
        let free = PlanTier::Free.limits();
        assert_eq!(free.work_orders_per_month, Quota::Limited(1000));
        assert_eq!(free.team_members, Quota::Limited(3));
        assert!(free.features.iter().all(|(_, on)| !on));
    }

    #[test]
    fn professional_work_orders_unlimited() {
        let pro = PlanTier::Professional.limits();
        assert!(pro.work_orders_per_month.is_unlimited());
        assert!(pro.team_members.is_unlimited());
        assert!(pro.has_feature(Feature::CustomIntegrations));
        assert!(!pro.has_feature(Feature::WhiteLabel));
    }

    #[test]
    fn enterprise_is_unlimited_everywhere() {
        let ent = PlanTier::Enterprise.limits();
        for kind in QuotaKind::ALL {
            assert!(ent.quota(kind).is_unlimited(), "{kind:?}");
        }
    }

    #[test]
    fn quotas_are_sentinel_or_non_negative() {
        for tier in PlanTier::ALL {
            for kind in QuotaKind::ALL {
                let v = tier.limits().quota(kind).as_sentinel();
                assert!(v == UNLIMITED || v >= 0);
            }
        }
    }

    #[test]
    fn tier_db_round_trip() {
        for tier in PlanTier::ALL {
            assert_eq!(PlanTier::from_db(tier.as_db()), Some(tier));
        }
        assert_eq!(PlanTier::from_db("gold"), None);
        assert_eq!(PlanTier::from_db("Free"), None);
    }

    #[test]
    fn tier_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&PlanTier::Professional).unwrap(),
            "\"professional\""
        );
        assert_eq!(PlanTier::default(), PlanTier::Free);
        assert!(PlanTier::Enterprise.is_paid());
        assert!(!PlanTier::Free.is_paid());
    }
}
