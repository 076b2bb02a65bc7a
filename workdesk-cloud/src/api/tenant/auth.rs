//! POST /api/login

use axum::{Json, extract::State};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};

use crate::api::register::AuthResponse;
use crate::db;
use crate::error::ServiceResult;
use crate::state::AppState;
use crate::util::verify_password;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ServiceResult<Json<AuthResponse>> {
    let email = req.email.trim().to_lowercase();
    let tenant = db::tenants::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::InvalidCredentials))?;

    if !verify_password(&req.password, &tenant.hashed_password) {
        return Err(AppError::new(ErrorCode::InvalidCredentials).into());
    }

    let token =
        crate::auth::tenant_auth::create_token(&tenant.id, &tenant.email, &state.jwt_secret)
            .map_err(|e| {
                tracing::error!("JWT creation failed: {e}");
                AppError::new(ErrorCode::InternalError)
            })?;

    Ok(Json(AuthResponse {
        token,
        tenant_id: tenant.id,
    }))
}
