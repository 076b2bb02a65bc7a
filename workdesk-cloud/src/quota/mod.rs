//! Plan-based resource gating
//!
//! - [`ensure_subscription`]: every tenant gets a free-tier record before any
//!   gated action is evaluated. Never fails from the caller's point of view.
//! - [`check_limit`]: compares current usage against the plan quota for an
//!   action. Business-rule denial and data-access failure are distinct
//!   [`GateError`] variants.
//! - [`check_feature`]: same resolution, for boolean plan features.
//!
//! The gate reads usage and the caller writes the new resource in a later,
//! separate statement. Two concurrent requests from one tenant can both pass
//! the check; nothing here serialises them.

mod enforce;
mod provision;

pub use enforce::{check_feature, check_limit, subscription_summary};
pub use provision::ensure_subscription;

use shared::error::{AppError, ErrorCode};
use shared::plan::{Feature, PlanTier};
use shared::subscription::LimitAction;

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("{action} denied: usage {usage} reached {tier} limit {limit}")]
    LimitExceeded {
        action: LimitAction,
        tier: PlanTier,
        limit: u32,
        usage: u64,
    },
    #[error("feature {feature} not included in {tier} plan")]
    FeatureUnavailable { feature: Feature, tier: PlanTier },
    #[error("subscription lookup failed: {0}")]
    DataAccess(#[from] StoreError),
}

impl From<GateError> for AppError {
    fn from(e: GateError) -> Self {
        match e {
            GateError::LimitExceeded {
                action,
                tier,
                limit,
                usage,
            } => AppError::new(action.limit_error_code())
                .with_detail("tier", tier.as_db())
                .with_detail("limit", limit)
                .with_detail("usage", usage)
                .with_detail("upgrade_required", true),
            GateError::FeatureUnavailable { feature, tier } => {
                AppError::new(ErrorCode::FeatureNotAvailable)
                    .with_detail("feature", feature.as_str())
                    .with_detail("tier", tier.as_db())
                    .with_detail("upgrade_required", true)
            }
            // Already logged by the gate; the caller aborts the guarded action.
            GateError::DataAccess(_) => AppError::new(ErrorCode::DatabaseError),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_exceeded_maps_to_upgrade_prompt() {
        let err: AppError = GateError::LimitExceeded {
            action: LimitAction::CreateWorkOrder,
            tier: PlanTier::Free,
            limit: 1000,
            usage: 1000,
        }
        .into();

        assert_eq!(err.code, ErrorCode::WorkOrderLimitReached);
        let details = err.details.unwrap();
        assert_eq!(details["tier"], "free");
        assert_eq!(details["limit"], 1000);
        assert_eq!(details["upgrade_required"], true);
    }

    #[test]
    fn team_limit_uses_team_code() {
        let err: AppError = GateError::LimitExceeded {
            action: LimitAction::AddTeamMember,
            tier: PlanTier::Free,
            limit: 3,
            usage: 3,
        }
        .into();
        assert_eq!(err.code, ErrorCode::TeamMemberLimitReached);
    }

    #[test]
    fn data_access_is_not_a_business_error() {
        let err: AppError = GateError::DataAccess(StoreError::Unavailable("down".into())).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(err.details.is_none());
    }
}
