use shared::plan::PlanTier;
use shared::subscription::{SubscriptionRecord, SubscriptionStatus};
use sqlx::PgPool;

use crate::store::{StoreError, SubscriptionUpdate};

#[derive(sqlx::FromRow)]
pub struct SubscriptionRow {
    pub id: String,
    pub tenant_id: String,
    pub tier: String,
    pub status: String,
    pub billing_customer_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TryFrom<SubscriptionRow> for SubscriptionRecord {
    type Error = StoreError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let tier = PlanTier::from_db(&row.tier).ok_or_else(|| StoreError::Corrupt {
            id: row.id.clone(),
            reason: format!("unknown tier '{}'", row.tier),
        })?;
        let status = SubscriptionStatus::from_db(&row.status).ok_or_else(|| StoreError::Corrupt {
            id: row.id.clone(),
            reason: format!("unknown status '{}'", row.status),
        })?;
        Ok(SubscriptionRecord {
            id: row.id,
            tenant_id: row.tenant_id,
            tier,
            status,
            billing_customer_id: row.billing_customer_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Newest active subscription of the tenant
pub async fn find_active(
    pool: &PgPool,
    tenant_id: &str,
) -> Result<Option<SubscriptionRecord>, StoreError> {
    let row: Option<SubscriptionRow> = sqlx::query_as(
        "SELECT id, tenant_id, tier, status, billing_customer_id, created_at, updated_at
         FROM subscriptions
         WHERE tenant_id = $1 AND status = 'active'
         ORDER BY created_at DESC
         LIMIT 1",
    )
    .bind(tenant_id)
    .fetch_optional(pool)
    .await?;
    row.map(SubscriptionRecord::try_from).transpose()
}

pub async fn insert(pool: &PgPool, record: &SubscriptionRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO subscriptions (id, tenant_id, tier, status, billing_customer_id, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(&record.id)
    .bind(&record.tenant_id)
    .bind(record.tier.as_db())
    .bind(record.status.as_db())
    .bind(record.billing_customer_id.as_deref())
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Patch the newest active subscription. Unset fields keep their value.
pub async fn update_active(
    pool: &PgPool,
    tenant_id: &str,
    update: &SubscriptionUpdate,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE subscriptions SET
            tier = COALESCE($2, tier),
            status = COALESCE($3, status),
            billing_customer_id = COALESCE($4, billing_customer_id),
            updated_at = $5
         WHERE id = (
            SELECT id FROM subscriptions
            WHERE tenant_id = $1 AND status = 'active'
            ORDER BY created_at DESC
            LIMIT 1
         )",
    )
    .bind(tenant_id)
    .bind(update.tier.map(|t| t.as_db()))
    .bind(update.status.map(|s| s.as_db()))
    .bind(update.billing_customer_id.as_deref())
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn find_tenant_by_customer(
    pool: &PgPool,
    customer_id: &str,
) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(String,)> = sqlx::query_as(
        "SELECT tenant_id FROM subscriptions
         WHERE billing_customer_id = $1
         ORDER BY created_at DESC
         LIMIT 1",
    )
    .bind(customer_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|r| r.0))
}
