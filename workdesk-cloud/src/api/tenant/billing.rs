//! POST /api/tenant/billing/checkout
//!
//! The Stripe customer is looked up by the email carried in the tenant token.

use axum::{Extension, Json, extract::State};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::plan::PlanTier;

use crate::auth::TenantIdentity;
use crate::error::ServiceResult;
use crate::state::AppState;
use crate::stripe::CheckoutRequest;

#[derive(Deserialize)]
pub struct CreateCheckoutRequest {
    pub tier: String,
}

pub async fn create_checkout(
    State(state): State<AppState>,
    Extension(identity): Extension<TenantIdentity>,
    Json(req): Json<CreateCheckoutRequest>,
) -> ServiceResult<Json<serde_json::Value>> {
    let tier = PlanTier::from_db(&req.tier)
        .ok_or_else(|| AppError::new(ErrorCode::UnknownPlan).with_detail("tier", req.tier.clone()))?;
    let price_id = match tier {
        PlanTier::Free => {
            return Err(AppError::validation("The free tier needs no checkout").into());
        }
        PlanTier::Professional => &state.stripe_professional_price_id,
        PlanTier::Enterprise => &state.stripe_enterprise_price_id,
    };

    let tenant_id = &identity.tenant_id;
    let customer_id = resolve_customer(&state, tenant_id, &identity.email).await?;

    let success_url = format!("{}/billing/success", state.app_base_url);
    let cancel_url = format!("{}/billing/cancel", state.app_base_url);
    let checkout_url = state
        .billing
        .create_checkout_session(&CheckoutRequest {
            customer_id: &customer_id,
            price_id,
            tenant_id,
            tier,
            success_url: &success_url,
            cancel_url: &cancel_url,
        })
        .await
        .map_err(|e| {
            tracing::error!(%e, "Failed to create Stripe checkout");
            AppError::new(ErrorCode::PaymentSetupFailed)
        })?;

    tracing::info!(tenant_id = %tenant_id, tier = %tier, "Checkout session created");

    Ok(Json(serde_json::json!({
        "checkout_url": checkout_url,
    })))
}

/// Reuse the customer on the active record, then any customer registered
/// under the tenant email, else create one.
async fn resolve_customer(
    state: &AppState,
    tenant_id: &str,
    email: &str,
) -> ServiceResult<String> {
    if let Some(cid) = state
        .store()
        .find_active(tenant_id)
        .await?
        .and_then(|r| r.billing_customer_id)
    {
        return Ok(cid);
    }

    let existing = state.billing.list_customers(email).await.map_err(|e| {
        tracing::error!(%e, "Failed to list Stripe customers");
        AppError::new(ErrorCode::PaymentSetupFailed)
    })?;
    if let Some(cid) = existing.into_iter().next() {
        return Ok(cid);
    }

    let cid = state
        .billing
        .create_customer(email, tenant_id)
        .await
        .map_err(|e| {
            tracing::error!(%e, "Failed to create Stripe customer");
            AppError::new(ErrorCode::PaymentSetupFailed)
        })?;
    Ok(cid)
}
