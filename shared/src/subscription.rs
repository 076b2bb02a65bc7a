//! Subscription record types shared by the cloud service and the console

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ErrorCode;
use crate::plan::{PlanLimits, PlanTier, QuotaKind};

/// Subscription lifecycle status
///
/// Records are never deleted; a canceled subscription becomes `Inactive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Inactive,
}

impl SubscriptionStatus {
    /// Parse from database string value (lowercase)
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }

    /// Database string representation (lowercase)
    pub const fn as_db(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

/// A tenant's subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub id: String,
    pub tenant_id: String,
    pub tier: PlanTier,
    pub status: SubscriptionStatus,
    /// Billing provider customer reference (Stripe `cus_...`)
    pub billing_customer_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl SubscriptionRecord {
    /// A fresh active free-tier record
    pub fn free(tenant_id: &str, now: i64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            tier: PlanTier::Free,
            status: SubscriptionStatus::Active,
            billing_customer_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn limits(&self) -> &'static PlanLimits {
        self.tier.limits()
    }
}

/// Actions guarded by a plan quota
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitAction {
    CreateWorkOrder,
    AddTeamMember,
}

impl LimitAction {
    /// Quota consumed by this action
    pub const fn quota_kind(&self) -> QuotaKind {
        match self {
            Self::CreateWorkOrder => QuotaKind::WorkOrdersPerMonth,
            Self::AddTeamMember => QuotaKind::TeamMembers,
        }
    }

    /// Error code reported when the quota is used up
    pub const fn limit_error_code(&self) -> ErrorCode {
        match self {
            Self::CreateWorkOrder => ErrorCode::WorkOrderLimitReached,
            Self::AddTeamMember => ErrorCode::TeamMemberLimitReached,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CreateWorkOrder => "create_work_order",
            Self::AddTeamMember => "add_team_member",
        }
    }
}

impl fmt::Display for LimitAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Usage counters for a tenant, as reported to the console
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// Work orders created since the start of the current billing period
    pub work_orders_this_period: u64,
    /// Active team members
    pub team_members: u64,
}

/// Subscription summary for the console's plan page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionSummary {
    pub tier: PlanTier,
    pub status: SubscriptionStatus,
    pub limits: PlanLimits,
    pub usage: UsageSnapshot,
}
