use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use merx_core::catalog::{CatalogProduct, ProductCatalogClient};
use merx_core::error::{OrderError, OrderResult};
use merx_core::payment::{PaymentSessionClient, SessionLineItem};

use crate::models::{
    LineWithProduct, NewOrderItem, Order, OrderLine, OrderListQuery, OrderPage, OrderStatus,
    OrderWithLines, OrderWithProducts, PageMeta,
};
use crate::pricing::build_snapshot;
use crate::repository::OrderRepository;
use crate::status::{check_transition, Transition};

/// The orchestration core. Holds no mutable state of its own; safe to share
/// across concurrent requests. Composes the catalog client, the price
/// snapshot builder, the repository, and the payment client.
pub struct OrderOrchestrator {
    repo: Arc<dyn OrderRepository>,
    catalog: Arc<dyn ProductCatalogClient>,
    payments: Arc<dyn PaymentSessionClient>,
    settlement_currency: String,
}

impl OrderOrchestrator {
    pub fn new(
        repo: Arc<dyn OrderRepository>,
        catalog: Arc<dyn ProductCatalogClient>,
        payments: Arc<dyn PaymentSessionClient>,
        settlement_currency: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            catalog,
            payments,
            settlement_currency: settlement_currency.into(),
        }
    }

    /// Create an order: validate the requested products against the catalog,
    /// capture a price snapshot, persist header and lines atomically, and
    /// return the order enriched with current product names.
    pub async fn create(&self, items: Vec<NewOrderItem>) -> OrderResult<OrderWithProducts> {
        if items.is_empty() {
            return Err(OrderError::Validation(
                "an order needs at least one line item".into(),
            ));
        }

        let mut ids: Vec<i64> = items.iter().map(|i| i.product_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let products = self.validate_products(&ids).await?;
        let snapshot = build_snapshot(&items, &products)?;
        let created = self.repo.create_with_lines(&snapshot).await?;

        tracing::info!(
            order_id = %created.order.id,
            total_amount = created.order.total_amount,
            total_items = created.order.total_items,
            "order created"
        );

        Ok(enrich(created, Some(&products)))
    }

    /// Load one order with its lines, enriched with current catalog names.
    ///
    /// The name join is a display concern: if the catalog is down the read
    /// still succeeds, with `product_name: None` on every line.
    pub async fn find_one(&self, id: Uuid) -> OrderResult<OrderWithProducts> {
        let record = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(OrderError::NotFound(id))?;

        let ids: Vec<i64> = record.lines.iter().map(|l| l.product_id).collect();
        let products = match self.validate_products(&ids).await {
            Ok(products) => Some(products),
            Err(err) => {
                tracing::warn!(
                    order_id = %id,
                    error = %err,
                    "catalog lookup failed, returning order without product names"
                );
                None
            }
        };

        Ok(enrich(record, products.as_ref()))
    }

    /// One page of orders plus pagination metadata.
    pub async fn find_all(&self, query: &OrderListQuery) -> OrderResult<OrderPage> {
        let (page, limit) = query.normalize()?;
        let total = self.repo.count(query.status).await?;
        let last_page = (total as i64 + limit - 1) / limit;

        let data = self
            .repo
            .find_page(query.status, (page - 1) * limit, limit)
            .await?;

        Ok(OrderPage {
            data,
            meta: PageMeta {
                total,
                current_page: page,
                last_page,
            },
        })
    }

    /// Apply a status transition. Requesting the status the order already
    /// has returns the order unchanged without touching the repository; an
    /// illegal edge fails with `InvalidTransition` and mutates nothing.
    pub async fn change_status(&self, id: Uuid, target: OrderStatus) -> OrderResult<Order> {
        let record = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(OrderError::NotFound(id))?;

        match check_transition(record.order.status, target)? {
            Transition::Unchanged => Ok(record.order),
            Transition::Apply => {
                let updated = self
                    .repo
                    .update_status(id, record.order.status, target)
                    .await?;
                tracing::info!(
                    order_id = %id,
                    from = %record.order.status,
                    to = %target,
                    "order status changed"
                );
                Ok(updated)
            }
        }
    }

    /// Obtain a checkout session reference for a priced order. Never mutates
    /// order state. Settlement arrives asynchronously via
    /// [`confirm_payment`](Self::confirm_payment).
    pub async fn initiate_payment(&self, order: &OrderWithProducts) -> OrderResult<String> {
        let items = order
            .items
            .iter()
            .map(|line| SessionLineItem {
                name: line
                    .product_name
                    .clone()
                    .unwrap_or_else(|| format!("Product {}", line.product_id)),
                price: line.unit_price,
                quantity: line.quantity,
            })
            .collect();

        self.payments
            .create_session(order.order.id, &self.settlement_currency, items)
            .await
    }

    /// Idempotent settlement handler for asynchronous payment confirmations.
    ///
    /// A duplicate confirmation for an already-paid order is a no-op that
    /// returns the stored order. The real guard is the repository's
    /// paid-gated conditional update; the early return here only skips the
    /// write for the common duplicate case.
    pub async fn confirm_payment(
        &self,
        order_id: Uuid,
        payment_reference: &str,
        receipt_url: &str,
    ) -> OrderResult<OrderWithLines> {
        let record = self
            .repo
            .find_by_id(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;

        if record.order.paid {
            tracing::info!(
                order_id = %order_id,
                payment_reference,
                "duplicate payment confirmation ignored"
            );
            return Ok(record);
        }

        let settled = self
            .repo
            .settle_payment(order_id, payment_reference, receipt_url)
            .await?;

        tracing::info!(
            order_id = %order_id,
            payment_reference,
            "order settled"
        );
        Ok(settled)
    }

    async fn validate_products(&self, ids: &[i64]) -> OrderResult<HashMap<i64, CatalogProduct>> {
        let products = self.catalog.validate(ids).await?;
        Ok(products.into_iter().map(|p| (p.id, p)).collect())
    }
}

fn enrich(
    record: OrderWithLines,
    products: Option<&HashMap<i64, CatalogProduct>>,
) -> OrderWithProducts {
    let items = record
        .lines
        .into_iter()
        .map(|line: OrderLine| LineWithProduct {
            product_name: products
                .and_then(|map| map.get(&line.product_id))
                .map(|p| p.name.clone()),
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
        })
        .collect();

    OrderWithProducts {
        order: record.order,
        items,
    }
}
