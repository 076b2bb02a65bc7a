//! Registration API handler
//!
//! POST /api/register: create tenant, provision the free plan, return a JWT

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};

use crate::auth::tenant_auth::create_token;
use crate::db;
use crate::error::ServiceResult;
use crate::quota;
use crate::state::AppState;
use crate::util::hash_password;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub tenant_id: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ServiceResult<(StatusCode, Json<AuthResponse>)> {
    let email = req.email.trim().to_lowercase();

    if email.is_empty() || !email.contains('@') {
        return Err(AppError::validation("Invalid email").with_detail("field", "email").into());
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::new(ErrorCode::PasswordTooShort).into());
    }

    if db::tenants::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::with_message(ErrorCode::AlreadyExists, "Email already registered").into());
    }

    let hashed_password =
        hash_password(&req.password).map_err(|_| AppError::new(ErrorCode::InternalError))?;

    let tenant_id = uuid::Uuid::new_v4().to_string();
    let now = shared::util::now_millis();
    let name = req.name.as_deref().map(str::trim).filter(|n| !n.is_empty());

    if let Err(e) =
        db::tenants::create(&state.pool, &tenant_id, &email, &hashed_password, name, now).await
    {
        // Lost a race with a concurrent registration for the same email
        if e.as_database_error().is_some_and(|d| d.is_unique_violation()) {
            return Err(
                AppError::with_message(ErrorCode::AlreadyExists, "Email already registered").into(),
            );
        }
        return Err(e.into());
    }

    // Registration succeeds even if this fails; the gate provisions lazily.
    quota::ensure_subscription(state.store(), &tenant_id).await;

    let token = create_token(&tenant_id, &email, &state.jwt_secret).map_err(|e| {
        tracing::error!("JWT creation failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;

    tracing::info!(tenant_id = %tenant_id, "Tenant registered");

    Ok((StatusCode::CREATED, Json(AuthResponse { token, tenant_id })))
}
