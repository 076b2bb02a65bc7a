//! Stripe webhook handler
//!
//! POST /stripe/webhook: applies billing events (raw body for signature verification)

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use shared::error::{AppError, ErrorCode};

use crate::db;
use crate::state::AppState;
use crate::stripe::{self, Applied, BillingEvent};

/// Handle incoming Stripe webhook events
///
/// Must receive raw body (not JSON) for HMAC signature verification.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let Some(sig_header) = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
    else {
        tracing::warn!("Missing Stripe-Signature header");
        return Err(AppError::with_message(
            ErrorCode::WebhookSignatureInvalid,
            "Missing Stripe-Signature header",
        ));
    };

    if let Err(e) =
        stripe::verify_webhook_signature(&body, sig_header, &state.stripe_webhook_secret)
    {
        tracing::warn!(error = e, "Webhook signature verification failed");
        return Err(AppError::with_message(ErrorCode::WebhookSignatureInvalid, e));
    }

    let event: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(%e, "Failed to parse webhook JSON");
        AppError::with_message(ErrorCode::InvalidRequest, "Webhook body is not JSON")
    })?;

    let event_type = event["type"].as_str().unwrap_or("");
    let Some(event_id) = event["id"].as_str() else {
        tracing::warn!("Webhook event missing id");
        return Err(AppError::with_message(ErrorCode::InvalidRequest, "Webhook event missing id"));
    };
    tracing::info!(event_id, event_type, "Received Stripe webhook");

    // Idempotency: INSERT first, check rows_affected
    let now = shared::util::now_millis();
    match db::webhook_events::record(&state.pool, event_id, event_type, now).await {
        Ok(false) => {
            tracing::info!(event_id, "Duplicate webhook event, skipping");
            return Ok(StatusCode::OK);
        }
        Ok(true) => {}
        Err(e) => {
            tracing::error!(%e, "DB error recording webhook event");
            return Err(AppError::new(ErrorCode::DatabaseError));
        }
    }

    let billing_event = match BillingEvent::parse(&event) {
        Ok(ev) => ev,
        Err(e) => {
            // Malformed payloads are acknowledged so Stripe stops retrying
            tracing::warn!(event_id, error = %e, "Unusable billing event");
            return Ok(StatusCode::OK);
        }
    };

    match billing_event.apply(state.store(), now).await {
        Ok(Applied::TierChanged { tenant_id, tier }) => {
            tracing::info!(event_id, tenant_id = %tenant_id, tier = %tier, "Subscription tier applied");
        }
        Ok(Applied::Deactivated { tenant_id }) => {
            tracing::info!(event_id, tenant_id = %tenant_id, "Subscription deactivated");
        }
        Ok(Applied::Unresolved) => {
            tracing::warn!(event_id, event_type, "No tenant for billing event");
        }
        Ok(Applied::Ignored) => {
            tracing::debug!(event_id, event_type, "Unhandled webhook event type");
        }
        Err(e) => {
            tracing::error!(event_id, error = %e, "Failed to apply billing event");
            // Let Stripe's retry reprocess it
            if let Err(e) = db::webhook_events::forget(&state.pool, event_id).await {
                tracing::error!(event_id, %e, "Failed to release webhook event");
            }
            return Err(AppError::new(ErrorCode::InternalError));
        }
    }

    Ok(StatusCode::OK)
}
