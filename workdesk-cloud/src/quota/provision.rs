//! Provisioning hook: make sure a tenant has a subscription record

use shared::subscription::SubscriptionRecord;

use crate::store::{StoreError, SubscriptionStore};

/// Successful provisioning outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    /// An active record was already present
    Existing,
    /// A free-tier record was created
    Created,
}

/// Look up the tenant's active record and create a free-tier one if absent.
///
/// Two concurrent calls for the same tenant can both observe "absent" and
/// insert; there is no uniqueness constraint on active records.
pub async fn try_provision(
    store: &dyn SubscriptionStore,
    tenant_id: &str,
) -> Result<Provisioned, StoreError> {
    if store.find_active(tenant_id).await?.is_some() {
        return Ok(Provisioned::Existing);
    }

    let record = SubscriptionRecord::free(tenant_id, shared::util::now_millis());
    store.insert(&record).await?;
    tracing::info!(
        tenant_id = %tenant_id,
        subscription_id = %record.id,
        "Provisioned free subscription"
    );
    Ok(Provisioned::Created)
}

/// Provisioning for callers whose primary action must not be blocked
/// (registration, gated routes). Failures are logged and dropped.
pub async fn ensure_subscription(store: &dyn SubscriptionStore, tenant_id: &str) {
    if let Err(e) = try_provision(store, tenant_id).await {
        tracing::error!(tenant_id = %tenant_id, error = %e, "Subscription provisioning failed");
    }
}
