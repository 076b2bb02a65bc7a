//! Per-plan quotas and feature flags

use serde::{Deserialize, Serialize};
use std::fmt;

/// Database / wire sentinel meaning "no limit"
pub const UNLIMITED: i64 = -1;

/// A numeric allowance for one resource
///
/// Encoded as a non-negative integer or [`UNLIMITED`] (`-1`) at every
/// serialization boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum Quota {
    Limited(u32),
    Unlimited,
}

impl Quota {
    pub const fn is_unlimited(&self) -> bool {
        matches!(self, Quota::Unlimited)
    }

    /// `true` while `usage` is still below the allowance.
    pub const fn allows(&self, usage: u64) -> bool {
        match self {
            Quota::Unlimited => true,
            Quota::Limited(max) => usage < *max as u64,
        }
    }

    /// Sentinel encoding (`-1` for unlimited)
    pub const fn as_sentinel(&self) -> i64 {
        match self {
            Quota::Unlimited => UNLIMITED,
            Quota::Limited(max) => *max as i64,
        }
    }

    /// Parse the sentinel encoding. Negative values other than `-1` and
    /// values above `u32::MAX` are rejected.
    pub fn from_sentinel(value: i64) -> Option<Self> {
        match value {
            UNLIMITED => Some(Quota::Unlimited),
            v => u32::try_from(v).ok().map(Quota::Limited),
        }
    }
}

impl From<Quota> for i64 {
    fn from(quota: Quota) -> Self {
        quota.as_sentinel()
    }
}

/// Error when decoding an out-of-range quota value
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid quota value: {0}")]
pub struct InvalidQuota(pub i64);

impl TryFrom<i64> for Quota {
    type Error = InvalidQuota;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Quota::from_sentinel(value).ok_or(InvalidQuota(value))
    }
}

impl fmt::Display for Quota {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quota::Unlimited => f.write_str("unlimited"),
            Quota::Limited(max) => write!(f, "{max}"),
        }
    }
}

/// The four quota fields every plan defines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaKind {
    WorkOrdersPerMonth,
    TeamMembers,
    ApiCallsPerMonth,
    StorageGb,
}

impl QuotaKind {
    pub const ALL: [QuotaKind; 4] = [
        QuotaKind::WorkOrdersPerMonth,
        QuotaKind::TeamMembers,
        QuotaKind::ApiCallsPerMonth,
        QuotaKind::StorageGb,
    ];
}

/// Boolean plan features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    CustomBranding,
    WhiteLabel,
    ApiAccess,
    AdvancedAutomation,
    MultiLocation,
    AdvancedReporting,
    Webhooks,
    CustomIntegrations,
}

impl Feature {
    pub const ALL: [Feature; 8] = [
        Feature::CustomBranding,
        Feature::WhiteLabel,
        Feature::ApiAccess,
        Feature::AdvancedAutomation,
        Feature::MultiLocation,
        Feature::AdvancedReporting,
        Feature::Webhooks,
        Feature::CustomIntegrations,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Feature::CustomBranding => "custom_branding",
            Feature::WhiteLabel => "white_label",
            Feature::ApiAccess => "api_access",
            Feature::AdvancedAutomation => "advanced_automation",
            Feature::MultiLocation => "multi_location",
            Feature::AdvancedReporting => "advanced_reporting",
            Feature::Webhooks => "webhooks",
            Feature::CustomIntegrations => "custom_integrations",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub custom_branding: bool,
    pub white_label: bool,
    pub api_access: bool,
    pub advanced_automation: bool,
    pub multi_location: bool,
    pub advanced_reporting: bool,
    pub webhooks: bool,
    pub custom_integrations: bool,
}

impl FeatureFlags {
    pub const fn enabled(&self, feature: Feature) -> bool {
        match feature {
            Feature::CustomBranding => self.custom_branding,
            Feature::WhiteLabel => self.white_label,
            Feature::ApiAccess => self.api_access,
            Feature::AdvancedAutomation => self.advanced_automation,
            Feature::MultiLocation => self.multi_location,
            Feature::AdvancedReporting => self.advanced_reporting,
            Feature::Webhooks => self.webhooks,
            Feature::CustomIntegrations => self.custom_integrations,
        }
    }

    /// Every flag paired with its value, in [`Feature::ALL`] order
    pub fn iter(&self) -> impl Iterator<Item = (Feature, bool)> + '_ {
        Feature::ALL.into_iter().map(|f| (f, self.enabled(f)))
    }
}

/// Quotas and features granted by one plan tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    pub work_orders_per_month: Quota,
    pub team_members: Quota,
    pub api_calls_per_month: Quota,
    pub storage_gb: Quota,
    pub features: FeatureFlags,
}

impl PlanLimits {
    pub const fn quota(&self, kind: QuotaKind) -> Quota {
        match kind {
            QuotaKind::WorkOrdersPerMonth => self.work_orders_per_month,
            QuotaKind::TeamMembers => self.team_members,
            QuotaKind::ApiCallsPerMonth => self.api_calls_per_month,
            QuotaKind::StorageGb => self.storage_gb,
        }
    }

    pub const fn has_feature(&self, feature: Feature) -> bool {
        self.features.enabled(feature)
    }
}

pub(super) static FREE: PlanLimits = PlanLimits {
    work_orders_per_month: Quota::Limited(1000),
    team_members: Quota::Limited(3),
    api_calls_per_month: Quota::Limited(1000),
    storage_gb: Quota::Limited(1),
    features: FeatureFlags {
        custom_branding: false,
        white_label: false,
        api_access: false,
        advanced_automation: false,
        multi_location: false,
        advanced_reporting: false,
        webhooks: false,
        custom_integrations: false,
    },
};

pub(super) static PROFESSIONAL: PlanLimits = PlanLimits {
    work_orders_per_month: Quota::Unlimited,
    team_members: Quota::Unlimited,
    api_calls_per_month: Quota::Limited(50_000),
    storage_gb: Quota::Limited(100),
    features: FeatureFlags {
        custom_branding: true,
        white_label: false,
        api_access: true,
        advanced_automation: true,
        multi_location: false,
        advanced_reporting: true,
        webhooks: true,
        custom_integrations: true,
    },
};

pub(super) static ENTERPRISE: PlanLimits = PlanLimits {
    work_orders_per_month: Quota::Unlimited,
    team_members: Quota::Unlimited,
    api_calls_per_month: Quota::Unlimited,
    storage_gb: Quota::Unlimited,
    features: FeatureFlags {
        custom_branding: true,
        white_label: true,
        api_access: true,
        advanced_automation: true,
        multi_location: true,
        advanced_reporting: true,
        webhooks: true,
        custom_integrations: true,
    },
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_allows_strictly_below_limit() {
        let q = Quota::Limited(3);
        assert!(q.allows(0));
        assert!(q.allows(2));
        assert!(!q.allows(3));
        assert!(!q.allows(4));
    }

    #[test]
    fn unlimited_allows_everything() {
        assert!(Quota::Unlimited.allows(u64::MAX));
    }

    #[test]
    fn zero_quota_denies_first_use() {
        assert!(!Quota::Limited(0).allows(0));
    }

    #[test]
    fn sentinel_encoding() {
        assert_eq!(Quota::Unlimited.as_sentinel(), -1);
        assert_eq!(Quota::Limited(1000).as_sentinel(), 1000);
        assert_eq!(Quota::from_sentinel(-1), Some(Quota::Unlimited));
        assert_eq!(Quota::from_sentinel(0), Some(Quota::Limited(0)));
        assert_eq!(Quota::from_sentinel(-2), None);
        assert_eq!(Quota::from_sentinel(i64::from(u32::MAX) + 1), None);
    }

    #[test]
    fn quota_serializes_as_sentinel() {
        assert_eq!(serde_json::to_string(&Quota::Unlimited).unwrap(), "-1");
        assert_eq!(serde_json::to_string(&Quota::Limited(3)).unwrap(), "3");

        let q: Quota = serde_json::from_str("-1").unwrap();
        assert_eq!(q, Quota::Unlimited);
        assert!(serde_json::from_str::<Quota>("-5").is_err());
    }

    #[test]
    fn feature_flags_iterate_all_eight() {
        let flags = ENTERPRISE.features;
        let all: Vec<_> = flags.iter().collect();
        assert_eq!(all.len(), 8);
        assert!(all.iter().all(|(_, on)| *on));
    }

    #[test]
    fn feature_names_are_snake_case() {
        assert_eq!(Feature::CustomIntegrations.to_string(), "custom_integrations");
        assert_eq!(
            serde_json::to_string(&Feature::WhiteLabel).unwrap(),
            "\"white_label\""
        );
    }
}
