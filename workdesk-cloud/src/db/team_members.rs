use serde::Serialize;
use sqlx::PgPool;

#[derive(sqlx::FromRow, Serialize)]
pub struct TeamMember {
    pub id: String,
    pub tenant_id: String,
    pub email: String,
    pub name: Option<String>,
    pub role: String,
    pub active: bool,
    pub created_at: i64,
}

pub struct NewTeamMember<'a> {
    pub id: &'a str,
    pub tenant_id: &'a str,
    pub email: &'a str,
    pub name: Option<&'a str>,
    pub role: &'a str,
    pub now: i64,
}

/// Insert a member. Returns `None` when the email is already on the team.
pub async fn create(
    pool: &PgPool,
    member: &NewTeamMember<'_>,
) -> Result<Option<TeamMember>, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO team_members (id, tenant_id, email, name, role, active, created_at)
         VALUES ($1, $2, $3, $4, $5, TRUE, $6)
         ON CONFLICT (tenant_id, email) DO NOTHING
         RETURNING *",
    )
    .bind(member.id)
    .bind(member.tenant_id)
    .bind(member.email)
    .bind(member.name)
    .bind(member.role)
    .bind(member.now)
    .fetch_optional(pool)
    .await
}

pub async fn list(pool: &PgPool, tenant_id: &str) -> Result<Vec<TeamMember>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM team_members WHERE tenant_id = $1 AND active
         ORDER BY created_at",
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await
}

pub async fn count_active(pool: &PgPool, tenant_id: &str) -> Result<i64, sqlx::Error> {
    let row: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM team_members WHERE tenant_id = $1 AND active")
            .bind(tenant_id)
            .fetch_one(pool)
            .await?;
    Ok(row.0)
}
