//! Postgres-backed [`SubscriptionStore`]

use async_trait::async_trait;
use shared::subscription::{LimitAction, SubscriptionRecord};
use sqlx::PgPool;

use super::{subscriptions, team_members, tenants, work_orders};
use crate::store::{StoreError, SubscriptionStore, SubscriptionUpdate};

#[derive(Clone)]
pub struct PgSubscriptionStore {
    pool: PgPool,
}

impl PgSubscriptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionStore for PgSubscriptionStore {
    async fn find_active(&self, tenant_id: &str) -> Result<Option<SubscriptionRecord>, StoreError> {
        subscriptions::find_active(&self.pool, tenant_id).await
    }

    async fn insert(&self, record: &SubscriptionRecord) -> Result<(), StoreError> {
        Ok(subscriptions::insert(&self.pool, record).await?)
    }

    async fn update_active(
        &self,
        tenant_id: &str,
        update: &SubscriptionUpdate,
        now: i64,
    ) -> Result<bool, StoreError> {
        Ok(subscriptions::update_active(&self.pool, tenant_id, update, now).await?)
    }

    async fn tenant_exists(&self, tenant_id: &str) -> Result<bool, StoreError> {
        Ok(tenants::exists(&self.pool, tenant_id).await?)
    }

    async fn find_tenant_by_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<String>, StoreError> {
        Ok(subscriptions::find_tenant_by_customer(&self.pool, customer_id).await?)
    }

    async fn usage_count(
        &self,
        tenant_id: &str,
        action: LimitAction,
        period_start: i64,
    ) -> Result<u64, StoreError> {
        let count = match action {
            LimitAction::CreateWorkOrder => {
                work_orders::count_since(&self.pool, tenant_id, period_start).await?
            }
            LimitAction::AddTeamMember => team_members::count_active(&self.pool, tenant_id).await?,
        };
        Ok(u64::try_from(count).unwrap_or(0))
    }
}
