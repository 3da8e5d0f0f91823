use axum::{extract::State, Json};
use serde::Deserialize;
use uuid::Uuid;

use merx_order::models::OrderWithLines;

use crate::error::AppError;
use crate::state::AppState;

/// Asynchronous payment confirmation as the payment service delivers it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmedEvent {
    pub order_id: Uuid,
    pub payment_reference: String,
    pub receipt_url: String,
}

/// POST /v1/webhooks/payments
/// Settle an order from a payment confirmation event. Safe under duplicate
/// or out-of-order delivery: a confirmation for an already-paid order is a
/// no-op that returns the stored order.
pub async fn handle_payment_confirmed(
    State(state): State<AppState>,
    Json(event): Json<PaymentConfirmedEvent>,
) -> Result<Json<OrderWithLines>, AppError> {
    tracing::info!(
        order_id = %event.order_id,
        payment_reference = %event.payment_reference,
        "payment confirmation received"
    );

    let settled = state
        .orchestrator
        .confirm_payment(event.order_id, &event.payment_reference, &event.receipt_url)
        .await?;

    Ok(Json(settled))
}
