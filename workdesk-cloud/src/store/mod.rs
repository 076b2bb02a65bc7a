//! Subscription record store
//!
//! The quota gate and billing event handling talk to subscription state only
//! through [`SubscriptionStore`], so tests can swap Postgres for the
//! in-memory store.

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use shared::plan::PlanTier;
use shared::subscription::{LimitAction, SubscriptionRecord, SubscriptionStatus};

/// Data-access failure
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(sqlx::Error),
    #[error("corrupt subscription row {id}: {reason}")]
    Corrupt { id: String, reason: String },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(e.to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

/// Partial update applied to a tenant's active subscription
#[derive(Debug, Clone, Default)]
pub struct SubscriptionUpdate {
    pub tier: Option<PlanTier>,
    pub status: Option<SubscriptionStatus>,
    pub billing_customer_id: Option<String>,
}

impl SubscriptionUpdate {
    pub fn tier(tier: PlanTier) -> Self {
        Self {
            tier: Some(tier),
            ..Default::default()
        }
    }

    pub fn deactivate() -> Self {
        Self {
            status: Some(SubscriptionStatus::Inactive),
            ..Default::default()
        }
    }

    pub fn with_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.billing_customer_id = Some(customer_id.into());
        self
    }
}

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Newest active record for the tenant
    async fn find_active(&self, tenant_id: &str) -> Result<Option<SubscriptionRecord>, StoreError>;

    async fn insert(&self, record: &SubscriptionRecord) -> Result<(), StoreError>;

    /// Apply `update` to the tenant's active record. Returns `false` when the
    /// tenant has no active record.
    async fn update_active(
        &self,
        tenant_id: &str,
        update: &SubscriptionUpdate,
        now: i64,
    ) -> Result<bool, StoreError>;

    /// Whether a tenant account with this id exists
    async fn tenant_exists(&self, tenant_id: &str) -> Result<bool, StoreError>;

    /// Tenant owning any (active or inactive) record with this customer reference
    async fn find_tenant_by_customer(&self, customer_id: &str)
    -> Result<Option<String>, StoreError>;

    /// Current usage of the quota `action` consumes. `period_start` bounds
    /// monthly quotas; non-periodic counts ignore it.
    async fn usage_count(
        &self,
        tenant_id: &str,
        action: LimitAction,
        period_start: i64,
    ) -> Result<u64, StoreError>;
}
