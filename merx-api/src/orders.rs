use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use merx_order::models::{
    NewOrderItem, Order, OrderListQuery, OrderPage, OrderStatus, OrderWithProducts,
};

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSessionResponse {
    pub order_id: Uuid,
    pub session_reference: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/orders
/// Create an order from product references and quantities
pub async fn create_order(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderWithProducts>), AppError> {
    let order = state.orchestrator.create(req.items).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /v1/orders?status=&page=&limit=
/// List orders with an optional status filter and pagination metadata
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<OrderPage>, AppError> {
    let page = state.orchestrator.find_all(&query).await?;
    Ok(Json(page))
}

/// GET /v1/orders/{id}
/// Retrieve one order, enriched with current catalog product names
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderWithProducts>, AppError> {
    let order = state.orchestrator.find_one(order_id).await?;
    Ok(Json(order))
}

/// PATCH /v1/orders/{id}/status
/// Request a status transition; same-status requests are idempotent no-ops
pub async fn change_order_status(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(req): Json<ChangeStatusRequest>,
) -> Result<Json<Order>, AppError> {
    let order = state.orchestrator.change_status(order_id, req.status).await?;
    Ok(Json(order))
}

/// POST /v1/orders/{id}/payment-session
/// Obtain a checkout session reference; never mutates the order
pub async fn create_payment_session(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<PaymentSessionResponse>, AppError> {
    let order = state.orchestrator.find_one(order_id).await?;
    let session_reference = state.orchestrator.initiate_payment(&order).await?;
    Ok(Json(PaymentSessionResponse {
        order_id,
        session_reference,
    }))
}
