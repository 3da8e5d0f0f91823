//! In-memory test doubles for the engine's external boundaries: a full
//! `OrderRepository` with the same conditional-update semantics as the
//! Postgres implementation, a fixed-map catalog client, and a recording
//! payment client.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use merx_core::catalog::{CatalogProduct, ProductCatalogClient};
use merx_core::error::{OrderError, OrderResult};
use merx_core::payment::{PaymentSessionClient, SessionLineItem};

use crate::models::{Order, OrderStatus, OrderWithLines, Receipt};
use crate::pricing::PriceSnapshot;
use crate::repository::OrderRepository;

#[derive(Default)]
struct Inner {
    orders: HashMap<Uuid, OrderWithLines>,
    // Insertion order, so pagination is deterministic.
    sequence: Vec<Uuid>,
    receipts: Vec<Receipt>,
    status_writes: usize,
    settle_writes: usize,
}

/// HashMap-backed `OrderRepository`. The write counters let tests assert
/// that idempotent no-ops really skip the storage layer.
#[derive(Default)]
pub struct InMemoryOrderRepository {
    inner: Mutex<Inner>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status_write_count(&self) -> usize {
        self.inner.lock().unwrap().status_writes
    }

    pub fn settle_write_count(&self) -> usize {
        self.inner.lock().unwrap().settle_writes
    }

    pub fn receipt_count(&self) -> usize {
        self.inner.lock().unwrap().receipts.len()
    }

    pub fn receipts(&self) -> Vec<Receipt> {
        self.inner.lock().unwrap().receipts.clone()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create_with_lines(&self, snapshot: &PriceSnapshot) -> OrderResult<OrderWithLines> {
        let record = OrderWithLines {
            order: Order::new(snapshot.total_amount, snapshot.total_items),
            lines: snapshot.lines.clone(),
        };
        let mut inner = self.inner.lock().unwrap();
        inner.sequence.push(record.order.id);
        inner.orders.insert(record.order.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> OrderResult<Option<OrderWithLines>> {
        Ok(self.inner.lock().unwrap().orders.get(&id).cloned())
    }

    async fn count(&self, status: Option<OrderStatus>) -> OrderResult<u64> {
        let inner = self.inner.lock().unwrap();
        let count = inner
            .orders
            .values()
            .filter(|r| status.map_or(true, |s| r.order.status == s))
            .count();
        Ok(count as u64)
    }

    async fn find_page(
        &self,
        status: Option<OrderStatus>,
        skip: i64,
        take: i64,
    ) -> OrderResult<Vec<Order>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .sequence
            .iter()
            .filter_map(|id| inner.orders.get(id))
            .filter(|r| status.map_or(true, |s| r.order.status == s))
            .skip(skip.max(0) as usize)
            .take(take.max(0) as usize)
            .map(|r| r.order.clone())
            .collect())
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
        new: OrderStatus,
    ) -> OrderResult<Order> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner
            .orders
            .get_mut(&id)
            .ok_or(OrderError::NotFound(id))?;
        if record.order.status != expected {
            return Err(OrderError::ConcurrentModification(id));
        }
        record.order.status = new;
        record.order.updated_at = Utc::now();
        let order = record.order.clone();
        inner.status_writes += 1;
        Ok(order)
    }

    async fn settle_payment(
        &self,
        id: Uuid,
        payment_reference: &str,
        receipt_url: &str,
    ) -> OrderResult<OrderWithLines> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner
            .orders
            .get_mut(&id)
            .ok_or(OrderError::NotFound(id))?;

        // The paid gate: an already-settled order is returned untouched.
        if record.order.paid {
            return Ok(record.clone());
        }

        let now = Utc::now();
        record.order.status = OrderStatus::Paid;
        record.order.paid = true;
        record.order.paid_at = Some(now);
        record.order.payment_reference = Some(payment_reference.to_string());
        record.order.receipt_url = Some(receipt_url.to_string());
        record.order.updated_at = now;
        let settled = record.clone();

        inner.receipts.push(Receipt {
            id: Uuid::new_v4(),
            order_id: id,
            receipt_url: receipt_url.to_string(),
            created_at: now,
        });
        inner.settle_writes += 1;
        Ok(settled)
    }
}

/// Catalog client serving a fixed product map, with switches for simulating
/// an outage and for changing a price after orders were created.
pub struct StaticCatalogClient {
    products: Mutex<HashMap<i64, CatalogProduct>>,
    outage: AtomicBool,
}

impl StaticCatalogClient {
    /// `(id, name, price, available)` tuples.
    pub fn new(products: Vec<(i64, &str, i64, bool)>) -> Self {
        let now = Utc::now();
        let products = products
            .into_iter()
            .map(|(id, name, price, available)| {
                (
                    id,
                    CatalogProduct {
                        id,
                        name: name.to_string(),
                        price,
                        available,
                        created_at: now,
                        updated_at: now,
                    },
                )
            })
            .collect();
        Self {
            products: Mutex::new(products),
            outage: AtomicBool::new(false),
        }
    }

    pub fn set_outage(&self, down: bool) {
        self.outage.store(down, Ordering::SeqCst);
    }

    pub fn set_price(&self, id: i64, price: i64) {
        if let Some(product) = self.products.lock().unwrap().get_mut(&id) {
            product.price = price;
            product.updated_at = Utc::now();
        }
    }
}

#[async_trait]
impl ProductCatalogClient for StaticCatalogClient {
    async fn validate(&self, ids: &[i64]) -> OrderResult<Vec<CatalogProduct>> {
        if self.outage.load(Ordering::SeqCst) {
            return Err(OrderError::CatalogUnavailable(
                "simulated catalog outage".into(),
            ));
        }
        let products = self.products.lock().unwrap();
        // Unknown ids are silently omitted, as the real catalog does.
        Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
    }
}

#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub order_id: Uuid,
    pub currency: String,
    pub items: Vec<SessionLineItem>,
}

/// Payment client returning deterministic session references and recording
/// the last request for assertions.
#[derive(Default)]
pub struct MockPaymentSessionClient {
    last_request: Mutex<Option<SessionRequest>>,
}

impl MockPaymentSessionClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_request(&self) -> Option<SessionRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentSessionClient for MockPaymentSessionClient {
    async fn create_session(
        &self,
        order_id: Uuid,
        currency: &str,
        items: Vec<SessionLineItem>,
    ) -> OrderResult<String> {
        let session = format!("cs_{}", order_id.simple());
        *self.last_request.lock().unwrap() = Some(SessionRequest {
            order_id,
            currency: currency.to_string(),
            items,
        });
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderLine;

    fn snapshot() -> PriceSnapshot {
        PriceSnapshot {
            lines: vec![OrderLine { product_id: 1, quantity: 2, unit_price: 500 }],
            total_amount: 1000,
            total_items: 2,
        }
    }

    #[tokio::test]
    async fn create_then_find_returns_the_same_record() {
        let repo = InMemoryOrderRepository::new();
        let created = repo.create_with_lines(&snapshot()).await.unwrap();

        let found = repo.find_by_id(created.order.id).await.unwrap().unwrap();
        assert_eq!(found.order.id, created.order.id);
        assert_eq!(found.lines, created.lines);
    }

    #[tokio::test]
    async fn update_status_checks_the_expected_current_status() {
        let repo = InMemoryOrderRepository::new();
        let created = repo.create_with_lines(&snapshot()).await.unwrap();

        let err = repo
            .update_status(created.order.id, OrderStatus::Paid, OrderStatus::Delivered)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::ConcurrentModification(_)));
        assert_eq!(repo.status_write_count(), 0);
    }

    #[tokio::test]
    async fn pages_come_back_in_insertion_order() {
        let repo = InMemoryOrderRepository::new();
        let mut ids = Vec::new();
        for _ in 0..4 {
            ids.push(repo.create_with_lines(&snapshot()).await.unwrap().order.id);
        }

        let page = repo.find_page(None, 1, 2).await.unwrap();
        let got: Vec<Uuid> = page.iter().map(|o| o.id).collect();
        assert_eq!(got, ids[1..3].to_vec());
    }
}
