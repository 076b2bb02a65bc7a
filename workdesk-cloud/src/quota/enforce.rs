//! Limit and feature gates

use shared::plan::{Feature, PlanTier, Quota};
use shared::subscription::{LimitAction, SubscriptionStatus, SubscriptionSummary, UsageSnapshot};
use shared::util::{billing_period_start, now_millis};

use super::GateError;
use crate::store::{StoreError, SubscriptionStore};

/// Tier of the active record, or free when the tenant has none
async fn resolve_tier(store: &dyn SubscriptionStore, tenant_id: &str) -> Result<PlanTier, StoreError> {
    match store.find_active(tenant_id).await? {
        Some(record) => Ok(record.tier),
        None => {
            tracing::warn!(tenant_id = %tenant_id, "No active subscription, evaluating at free tier");
            Ok(PlanTier::Free)
        }
    }
}

fn data_access(tenant_id: &str, e: StoreError) -> GateError {
    tracing::error!(tenant_id = %tenant_id, error = %e, "Quota check failed");
    GateError::DataAccess(e)
}

/// Allow `action` when the tenant's quota is unlimited or usage is below it.
pub async fn check_limit(
    store: &dyn SubscriptionStore,
    tenant_id: &str,
    action: LimitAction,
) -> Result<(), GateError> {
    let tier = resolve_tier(store, tenant_id)
        .await
        .map_err(|e| data_access(tenant_id, e))?;

    let quota = tier.limits().quota(action.quota_kind());
    let limit = match quota {
        Quota::Unlimited => return Ok(()),
        Quota::Limited(max) => max,
    };

    let period_start = billing_period_start(now_millis());
    let usage = store
        .usage_count(tenant_id, action, period_start)
        .await
        .map_err(|e| data_access(tenant_id, e))?;

    if quota.allows(usage) {
        return Ok(());
    }

    tracing::info!(
        tenant_id = %tenant_id,
        action = %action,
        tier = %tier,
        limit,
        usage,
        "Plan limit reached"
    );
    Err(GateError::LimitExceeded {
        action,
        tier,
        limit,
        usage,
    })
}

/// Allow use of `feature` when the tenant's plan includes it.
pub async fn check_feature(
    store: &dyn SubscriptionStore,
    tenant_id: &str,
    feature: Feature,
) -> Result<(), GateError> {
    let tier = resolve_tier(store, tenant_id)
        .await
        .map_err(|e| data_access(tenant_id, e))?;

    if tier.limits().has_feature(feature) {
        Ok(())
    } else {
        Err(GateError::FeatureUnavailable { feature, tier })
    }
}

pub async fn subscription_summary(
    store: &dyn SubscriptionStore,
    tenant_id: &str,
) -> Result<SubscriptionSummary, StoreError> {
    let tier = resolve_tier(store, tenant_id).await?;
    let period_start = billing_period_start(now_millis());
    let work_orders = store
        .usage_count(tenant_id, LimitAction::CreateWorkOrder, period_start)
        .await?;
    let team_members = store
        .usage_count(tenant_id, LimitAction::AddTeamMember, period_start)
        .await?;

    Ok(SubscriptionSummary {
        tier,
        // Gates only ever evaluate an active record or the free fallback
        status: SubscriptionStatus::Active,
        limits: *tier.limits(),
        usage: UsageSnapshot {
            work_orders_this_period: work_orders,
            team_members,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;
    use shared::subscription::SubscriptionRecord;
    use tracing_test::traced_test;

    fn store_with(tier: PlanTier) -> InMemoryStore {
        let store = InMemoryStore::new();
        let mut rec = SubscriptionRecord::free("t1", 1);
        rec.tier = tier;
        store.seed(rec);
        store
    }

    #[tokio::test]
    async fn free_tier_work_order_limit() {
        let store = store_with(PlanTier::Free);
        store.set_usage("t1", LimitAction::CreateWorkOrder, 1000);

        let err = check_limit(&store, "t1", LimitAction::CreateWorkOrder)
            .await
            .unwrap_err();

        match err {
            GateError::LimitExceeded {
                action,
                tier,
                limit,
                usage,
            } => {
                assert_eq!(action, LimitAction::CreateWorkOrder);
                assert_eq!(tier, PlanTier::Free);
                assert_eq!(limit, 1000);
                assert_eq!(usage, 1000);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn free_tier_below_limit_is_allowed() {
        let store = store_with(PlanTier::Free);
        store.set_usage("t1", LimitAction::CreateWorkOrder, 999);

        check_limit(&store, "t1", LimitAction::CreateWorkOrder)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn professional_work_orders_always_allowed() {
        let store = store_with(PlanTier::Professional);
        for usage in [0, 1000, 1_000_000] {
            store.set_usage("t1", LimitAction::CreateWorkOrder, usage);
            check_limit(&store, "t1", LimitAction::CreateWorkOrder)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn free_team_member_boundary() {
        let store = store_with(PlanTier::Free);

        store.set_usage("t1", LimitAction::AddTeamMember, 2);
        check_limit(&store, "t1", LimitAction::AddTeamMember)
            .await
            .unwrap();

        store.set_usage("t1", LimitAction::AddTeamMember, 3);
        let err = check_limit(&store, "t1", LimitAction::AddTeamMember)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GateError::LimitExceeded { limit: 3, usage: 3, .. }
        ));
    }

    #[tokio::test]
    #[traced_test]
    async fn missing_record_is_evaluated_as_free() {
        let store = InMemoryStore::new();
        store.set_usage("t1", LimitAction::AddTeamMember, 3);

        let err = check_limit(&store, "t1", LimitAction::AddTeamMember)
            .await
            .unwrap_err();

        assert!(matches!(err, GateError::LimitExceeded { tier: PlanTier::Free, .. }));
        assert!(logs_contain("No active subscription"));
    }

    #[tokio::test]
    #[traced_test]
    async fn store_failure_is_data_access_not_denial() {
        let store = store_with(PlanTier::Free);
        store.set_failing(true);

        let err = check_limit(&store, "t1", LimitAction::CreateWorkOrder)
            .await
            .unwrap_err();

        assert!(matches!(err, GateError::DataAccess(StoreError::Unavailable(_))));
        assert!(logs_contain("Quota check failed"));
    }

    #[tokio::test]
    async fn feature_gate_follows_plan_flags() {
        let free = store_with(PlanTier::Free);
        let err = check_feature(&free, "t1", Feature::CustomIntegrations)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GateError::FeatureUnavailable {
                feature: Feature::CustomIntegrations,
                tier: PlanTier::Free
            }
        ));

        let pro = store_with(PlanTier::Professional);
        check_feature(&pro, "t1", Feature::CustomIntegrations)
            .await
            .unwrap();
        assert!(check_feature(&pro, "t1", Feature::WhiteLabel).await.is_err());

        let ent = store_with(PlanTier::Enterprise);
        check_feature(&ent, "t1", Feature::WhiteLabel).await.unwrap();
    }

    #[tokio::test]
    async fn summary_reports_usage_and_limits() {
        let store = store_with(PlanTier::Professional);
        store.set_usage("t1", LimitAction::CreateWorkOrder, 42);
        store.set_usage("t1", LimitAction::AddTeamMember, 7);

        let summary = subscription_summary(&store, "t1").await.unwrap();

        assert_eq!(summary.tier, PlanTier::Professional);
        assert_eq!(summary.status, SubscriptionStatus::Active);
        assert_eq!(summary.usage.work_orders_this_period, 42);
        assert_eq!(summary.usage.team_members, 7);
        assert!(summary.limits.work_orders_per_month.is_unlimited());
    }

    #[tokio::test]
    async fn summary_after_cancellation_is_active_free() {
        let store = InMemoryStore::new();
        let mut rec = SubscriptionRecord::free("t1", 1);
        rec.tier = PlanTier::Enterprise;
        rec.status = SubscriptionStatus::Inactive;
        store.seed(rec);

        let summary = subscription_summary(&store, "t1").await.unwrap();

        assert_eq!(summary.tier, PlanTier::Free);
        assert_eq!(summary.status, SubscriptionStatus::Active);
        assert_eq!(summary.limits.team_members, Quota::Limited(3));
    }
}
