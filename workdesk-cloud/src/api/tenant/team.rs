//! Team members: list and add (plan-gated)

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::subscription::LimitAction;

use crate::auth::TenantIdentity;
use crate::db;
use crate::db::team_members::{NewTeamMember, TeamMember};
use crate::error::ServiceResult;
use crate::quota;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AddTeamMemberRequest {
    pub email: String,
    pub name: Option<String>,
    pub role: Option<String>,
}

/// GET /api/tenant/team-members
pub async fn list_team_members(
    State(state): State<AppState>,
    Extension(identity): Extension<TenantIdentity>,
) -> ServiceResult<Json<Vec<TeamMember>>> {
    Ok(Json(
        db::team_members::list(&state.pool, &identity.tenant_id).await?,
    ))
}

/// POST /api/tenant/team-members
pub async fn add_team_member(
    State(state): State<AppState>,
    Extension(identity): Extension<TenantIdentity>,
    Json(req): Json<AddTeamMemberRequest>,
) -> ServiceResult<(StatusCode, Json<TeamMember>)> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::validation("Invalid email").with_detail("field", "email").into());
    }
    let role = req.role.as_deref().unwrap_or("member");
    if !matches!(role, "member" | "admin") {
        return Err(AppError::validation("Invalid role").with_detail("field", "role").into());
    }

    let tenant_id = &identity.tenant_id;
    quota::ensure_subscription(state.store(), tenant_id).await;
    quota::check_limit(state.store(), tenant_id, LimitAction::AddTeamMember).await?;

    let id = uuid::Uuid::new_v4().to_string();
    let member = NewTeamMember {
        id: &id,
        tenant_id,
        email: &email,
        name: req.name.as_deref(),
        role,
        now: shared::util::now_millis(),
    };
    let created = db::team_members::create(&state.pool, &member)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::TeamMemberExists))?;

    tracing::info!(tenant_id = %tenant_id, member_id = %created.id, "Team member added");
    Ok((StatusCode::CREATED, Json(created)))
}
