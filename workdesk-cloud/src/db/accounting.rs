//! QuickBooks OAuth state and stored connections

use sqlx::PgPool;

#[derive(sqlx::FromRow)]
pub struct AccountingConnection {
    pub tenant_id: String,
    pub realm_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub token_expires_at: i64,
    pub updated_at: i64,
}

pub async fn create_state(
    pool: &PgPool,
    state: &str,
    tenant_id: &str,
    expires_at: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO oauth_states (state, tenant_id, expires_at) VALUES ($1, $2, $3)")
        .bind(state)
        .bind(tenant_id)
        .bind(expires_at)
        .execute(pool)
        .await?;
    Ok(())
}

/// Consume an OAuth state. Returns the tenant if the state exists and has not expired.
pub async fn take_state(
    pool: &PgPool,
    state: &str,
    now: i64,
) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(String, i64)> =
        sqlx::query_as("DELETE FROM oauth_states WHERE state = $1 RETURNING tenant_id, expires_at")
            .bind(state)
            .fetch_optional(pool)
            .await?;
    Ok(row.and_then(|(tenant_id, expires_at)| (now <= expires_at).then_some(tenant_id)))
}

/// Delete states that expired before `now`; abandoned authorizations are never taken
pub async fn purge_expired_states(pool: &PgPool, now: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM oauth_states WHERE expires_at < $1")
        .bind(now)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn find(
    pool: &PgPool,
    tenant_id: &str,
) -> Result<Option<AccountingConnection>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM accounting_connections WHERE tenant_id = $1")
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
}

pub async fn upsert(pool: &PgPool, conn: &AccountingConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO accounting_connections
            (tenant_id, realm_id, access_token, refresh_token, token_expires_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (tenant_id) DO UPDATE SET
            realm_id = $2, access_token = $3, refresh_token = $4,
            token_expires_at = $5, updated_at = $6",
    )
    .bind(&conn.tenant_id)
    .bind(&conn.realm_id)
    .bind(&conn.access_token)
    .bind(&conn.refresh_token)
    .bind(conn.token_expires_at)
    .bind(conn.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tenants;

    /// Pool on `TEST_DATABASE_URL` with migrations applied; unset skips the test
    async fn test_pool() -> Option<PgPool> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let pool = PgPool::connect(&url).await.unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        Some(pool)
    }

    #[tokio::test]
    async fn purge_removes_only_expired_states() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let tenant_id = uuid::Uuid::new_v4().to_string();
        let email = format!("{tenant_id}@example.com");
        tenants::create(&pool, &tenant_id, &email, "hash", None, 0)
            .await
            .unwrap();

        let expired = format!("expired-{tenant_id}");
        let live = format!("live-{tenant_id}");
        create_state(&pool, &expired, &tenant_id, 100).await.unwrap();
        create_state(&pool, &live, &tenant_id, 10_000).await.unwrap();

        assert!(purge_expired_states(&pool, 1_000).await.unwrap() >= 1);

        // Taking the expired state at t=0 would succeed had the row survived
        assert_eq!(take_state(&pool, &expired, 0).await.unwrap(), None);
        assert_eq!(
            take_state(&pool, &live, 1_000).await.unwrap(),
            Some(tenant_id)
        );
    }
}
