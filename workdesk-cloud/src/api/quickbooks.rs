//! QuickBooks OAuth callback
//!
//! GET /api/quickbooks/callback: exchange the authorization code and store tokens

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};

use crate::db;
use crate::db::accounting::AccountingConnection;
use crate::error::ServiceResult;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    #[serde(rename = "realmId")]
    pub realm_id: Option<String>,
    pub error: Option<String>,
}

pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> ServiceResult<Json<serde_json::Value>> {
    if let Some(error) = query.error {
        tracing::warn!(error = %error, "QuickBooks authorization declined");
        return Err(AppError::with_message(ErrorCode::IntegrationFailed, error).into());
    }

    let (Some(code), Some(oauth_state), Some(realm_id)) = (query.code, query.state, query.realm_id)
    else {
        return Err(AppError::new(ErrorCode::RequiredField)
            .with_detail("fields", "code, state, realmId")
            .into());
    };

    let now = shared::util::now_millis();
    let tenant_id = db::accounting::take_state(&state.pool, &oauth_state, now)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OAuthStateInvalid))?;

    let tokens = state.accounting.exchange_code(&code).await.map_err(|e| {
        tracing::error!(tenant_id = %tenant_id, error = %e, "QuickBooks code exchange failed");
        AppError::new(ErrorCode::IntegrationFailed)
    })?;

    let conn = AccountingConnection {
        tenant_id: tenant_id.clone(),
        realm_id,
        token_expires_at: tokens.expires_at(now),
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        updated_at: now,
    };
    db::accounting::upsert(&state.pool, &conn).await?;

    tracing::info!(tenant_id = %tenant_id, realm_id = %conn.realm_id, "QuickBooks connected");

    Ok(Json(serde_json::json!({
        "connected": true,
        "realm_id": conn.realm_id,
    })))
}
