use serde::Serialize;
use sqlx::PgPool;

#[derive(sqlx::FromRow, Serialize)]
pub struct WorkOrder {
    pub id: String,
    pub tenant_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub created_at: i64,
}

pub async fn create(
    pool: &PgPool,
    id: &str,
    tenant_id: &str,
    title: &str,
    description: Option<&str>,
    now: i64,
) -> Result<WorkOrder, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO work_orders (id, tenant_id, title, description, status, created_at)
         VALUES ($1, $2, $3, $4, 'open', $5)
         RETURNING *",
    )
    .bind(id)
    .bind(tenant_id)
    .bind(title)
    .bind(description)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn list(
    pool: &PgPool,
    tenant_id: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<WorkOrder>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM work_orders WHERE tenant_id = $1
         ORDER BY created_at DESC
         LIMIT $2 OFFSET $3",
    )
    .bind(tenant_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Work orders created at or after `since` (ms)
pub async fn count_since(pool: &PgPool, tenant_id: &str, since: i64) -> Result<i64, sqlx::Error> {
    let row: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM work_orders WHERE tenant_id = $1 AND created_at >= $2")
            .bind(tenant_id)
            .bind(since)
            .fetch_one(pool)
            .await?;
    Ok(row.0)
}
