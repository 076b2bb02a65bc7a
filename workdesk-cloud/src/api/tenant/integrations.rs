//! POST /api/tenant/quickbooks/connect
//!
//! Requires the `custom_integrations` plan feature. Returns an authorize URL
//! for a new connection, or refreshes the tokens of an existing one.

use axum::{Extension, Json, extract::State};
use shared::error::{AppError, ErrorCode};
use shared::plan::Feature;

use crate::auth::TenantIdentity;
use crate::db;
use crate::error::ServiceResult;
use crate::quickbooks;
use crate::quota;
use crate::state::AppState;
use crate::util::random_token;

const STATE_TTL_MS: i64 = 10 * 60 * 1000;

pub async fn connect_quickbooks(
    State(state): State<AppState>,
    Extension(identity): Extension<TenantIdentity>,
) -> ServiceResult<Json<serde_json::Value>> {
    let tenant_id = &identity.tenant_id;
    quota::ensure_subscription(state.store(), tenant_id).await;
    quota::check_feature(state.store(), tenant_id, Feature::CustomIntegrations).await?;

    let now = shared::util::now_millis();

    if let Some(mut conn) = db::accounting::find(&state.pool, tenant_id).await? {
        let refreshed = quickbooks::refresh_if_expiring(state.accounting.as_ref(), &mut conn, now)
            .await
            .map_err(|e| {
                tracing::error!(tenant_id = %tenant_id, error = %e, "QuickBooks token refresh failed");
                AppError::new(ErrorCode::IntegrationFailed)
            })?;
        if refreshed {
            db::accounting::upsert(&state.pool, &conn).await?;
        }
        return Ok(Json(serde_json::json!({
            "connected": true,
            "realm_id": conn.realm_id,
            "token_expires_at": conn.token_expires_at,
        })));
    }

    let oauth_state = random_token();
    let authorize_url = state.accounting.authorize_url(&oauth_state).map_err(|e| {
        tracing::error!(error = %e, "QuickBooks authorize URL invalid");
        AppError::new(ErrorCode::ConfigError)
    })?;
    db::accounting::create_state(&state.pool, &oauth_state, tenant_id, now + STATE_TTL_MS).await?;

    Ok(Json(serde_json::json!({
        "connected": false,
        "authorize_url": authorize_url,
    })))
}
