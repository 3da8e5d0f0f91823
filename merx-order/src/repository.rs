use async_trait::async_trait;
use uuid::Uuid;

use merx_core::error::OrderResult;

use crate::models::{Order, OrderStatus, OrderWithLines};
use crate::pricing::PriceSnapshot;

/// Persistence boundary for orders. Every call is atomic on its own; the
/// engine never spans a transaction across calls.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist a new order header together with its lines in one commit.
    async fn create_with_lines(&self, snapshot: &PriceSnapshot) -> OrderResult<OrderWithLines>;

    async fn find_by_id(&self, id: Uuid) -> OrderResult<Option<OrderWithLines>>;

    /// Number of orders matching the optional status filter.
    async fn count(&self, status: Option<OrderStatus>) -> OrderResult<u64>;

    /// One page of order headers matching the filter, oldest first.
    async fn find_page(
        &self,
        status: Option<OrderStatus>,
        skip: i64,
        take: i64,
    ) -> OrderResult<Vec<Order>>;

    /// Compare-and-swap status update: succeeds only while the stored status
    /// still equals `expected`. A caller that lost the race gets
    /// `ConcurrentModification` and may re-read and retry.
    async fn update_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
        new: OrderStatus,
    ) -> OrderResult<Order>;

    /// Mark the order paid and record a receipt, gated on `paid = false` at
    /// the storage layer. Settling an already-paid order writes nothing and
    /// returns the stored order unchanged, which is what makes duplicate
    /// payment confirmations harmless.
    async fn settle_payment(
        &self,
        id: Uuid,
        payment_reference: &str,
        receipt_url: &str,
    ) -> OrderResult<OrderWithLines>;
}
