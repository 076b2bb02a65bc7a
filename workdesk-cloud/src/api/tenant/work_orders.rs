//! Work orders: list and create (plan-gated)

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::subscription::LimitAction;

use crate::auth::TenantIdentity;
use crate::db;
use crate::db::work_orders::WorkOrder;
use crate::error::ServiceResult;
use crate::quota;
use crate::state::AppState;

const MAX_TITLE_LEN: usize = 200;
const DEFAULT_PAGE: i64 = 50;
const MAX_PAGE: i64 = 200;

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Deserialize)]
pub struct CreateWorkOrderRequest {
    pub title: String,
    pub description: Option<String>,
}

/// GET /api/tenant/work-orders
pub async fn list_work_orders(
    State(state): State<AppState>,
    Extension(identity): Extension<TenantIdentity>,
    Query(query): Query<ListQuery>,
) -> ServiceResult<Json<Vec<WorkOrder>>> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE).clamp(1, MAX_PAGE);
    let offset = query.offset.unwrap_or(0).max(0);
    let orders = db::work_orders::list(&state.pool, &identity.tenant_id, limit, offset).await?;
    Ok(Json(orders))
}

/// POST /api/tenant/work-orders
pub async fn create_work_order(
    State(state): State<AppState>,
    Extension(identity): Extension<TenantIdentity>,
    Json(req): Json<CreateWorkOrderRequest>,
) -> ServiceResult<(StatusCode, Json<WorkOrder>)> {
    let title = req.title.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::new(ErrorCode::WorkOrderInvalidTitle)
            .with_detail("max_length", MAX_TITLE_LEN)
            .into());
    }

    let tenant_id = &identity.tenant_id;
    quota::ensure_subscription(state.store(), tenant_id).await;
    quota::check_limit(state.store(), tenant_id, LimitAction::CreateWorkOrder).await?;

    let id = uuid::Uuid::new_v4().to_string();
    let now = shared::util::now_millis();
    let order = db::work_orders::create(
        &state.pool,
        &id,
        tenant_id,
        title,
        req.description.as_deref(),
        now,
    )
    .await?;

    tracing::info!(tenant_id = %tenant_id, work_order_id = %order.id, "Work order created");
    Ok((StatusCode::CREATED, Json(order)))
}
