//! GET /api/tenant/subscription

use axum::{Extension, Json, extract::State};
use shared::subscription::SubscriptionSummary;

use crate::auth::TenantIdentity;
use crate::error::ServiceResult;
use crate::quota;
use crate::state::AppState;

pub async fn get_subscription(
    State(state): State<AppState>,
    Extension(identity): Extension<TenantIdentity>,
) -> ServiceResult<Json<SubscriptionSummary>> {
    quota::ensure_subscription(state.store(), &identity.tenant_id).await;
    let summary = quota::subscription_summary(state.store(), &identity.tenant_id).await?;
    Ok(Json(summary))
}
