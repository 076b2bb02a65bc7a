//! API routes for workdesk-cloud

pub mod health;
pub mod quickbooks;
pub mod register;
pub mod stripe_webhook;
pub mod tenant;

use crate::auth::rate_limit::{login_rate_limit, register_rate_limit};
use crate::auth::tenant_auth::tenant_auth_middleware;
use crate::state::AppState;
use axum::routing::{get, post};
use axum::{Router, middleware};
use tower_http::trace::TraceLayer;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Public auth (rate-limited per IP)
    let registration = Router::new()
        .route("/api/register", post(register::register))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            register_rate_limit,
        ));
    let login = Router::new()
        .route("/api/login", post(tenant::login))
        .layer(middleware::from_fn_with_state(state.clone(), login_rate_limit));

    // Stripe webhook (signature-verified, raw body)
    let webhook = Router::new().route("/stripe/webhook", post(stripe_webhook::handle_webhook));

    // QuickBooks redirect target (OAuth state authenticates the tenant)
    let oauth = Router::new().route("/api/quickbooks/callback", get(quickbooks::callback));

    // Tenant API (JWT authenticated)
    let tenant_api = Router::new()
        .route("/api/tenant/subscription", get(tenant::get_subscription))
        .route(
            "/api/tenant/work-orders",
            get(tenant::list_work_orders).post(tenant::create_work_order),
        )
        .route(
            "/api/tenant/team-members",
            get(tenant::list_team_members).post(tenant::add_team_member),
        )
        .route("/api/tenant/billing/checkout", post(tenant::create_checkout))
        .route(
            "/api/tenant/quickbooks/connect",
            post(tenant::connect_quickbooks),
        )
        .route("/api/tenant/assistant", post(tenant::ask_assistant))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            tenant_auth_middleware,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(registration)
        .merge(login)
        .merge(webhook)
        .merge(oauth)
        .merge(tenant_api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
