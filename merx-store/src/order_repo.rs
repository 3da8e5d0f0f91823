use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use merx_core::error::{OrderError, OrderResult};
use merx_order::models::{Order, OrderLine, OrderStatus, OrderWithLines};
use merx_order::pricing::PriceSnapshot;
use merx_order::repository::OrderRepository;

/// Postgres-backed `OrderRepository`.
///
/// Queries are bound at runtime (no compile-time macro checking) so the
/// crate builds without a live DATABASE_URL. Both mutation paths are
/// conditional: `update_status` carries the expected current status in its
/// WHERE clause and `settle_payment` is gated on `paid = FALSE`, relying on
/// the row-level atomicity of a single UPDATE.
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_lines(&self, order_id: Uuid) -> OrderResult<Vec<OrderLine>> {
        let rows = sqlx::query_as::<_, LineRow>(
            "SELECT product_id, quantity, unit_price FROM order_lines WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(LineRow::into_line).collect())
    }
}

const ORDER_COLUMNS: &str = "id, status, paid, paid_at, total_amount, total_items, \
     payment_reference, receipt_url, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    status: String,
    paid: bool,
    paid_at: Option<chrono::DateTime<chrono::Utc>>,
    total_amount: i64,
    total_items: i64,
    payment_reference: Option<String>,
    receipt_url: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl OrderRow {
    fn into_order(self) -> OrderResult<Order> {
        Ok(Order {
            id: self.id,
            status: OrderStatus::parse(&self.status)
                .map_err(|_| OrderError::Persistence(format!(
                    "order {} carries unknown status '{}'",
                    self.id, self.status
                )))?,
            paid: self.paid,
            paid_at: self.paid_at,
            total_amount: self.total_amount,
            total_items: self.total_items,
            payment_reference: self.payment_reference,
            receipt_url: self.receipt_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LineRow {
    product_id: i64,
    quantity: i32,
    unit_price: i64,
}

impl LineRow {
    fn into_line(self) -> OrderLine {
        OrderLine {
            product_id: self.product_id,
            quantity: self.quantity,
            unit_price: self.unit_price,
        }
    }
}

fn db_err(err: sqlx::Error) -> OrderError {
    tracing::error!(error = %err, "database operation failed");
    OrderError::Persistence(err.to_string())
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn create_with_lines(&self, snapshot: &PriceSnapshot) -> OrderResult<OrderWithLines> {
        let order = Order::new(snapshot.total_amount, snapshot.total_items);

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            "INSERT INTO orders (id, status, paid, total_amount, total_items, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(order.id)
        .bind(order.status.as_str())
        .bind(order.paid)
        .bind(order.total_amount)
        .bind(order.total_items)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        for line in &snapshot.lines {
            sqlx::query(
                "INSERT INTO order_lines (order_id, product_id, quantity, unit_price) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(order.id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;

        Ok(OrderWithLines {
            order,
            lines: snapshot.lines.clone(),
        })
    }

    async fn find_by_id(&self, id: Uuid) -> OrderResult<Option<OrderWithLines>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match row {
            Some(row) => {
                let order = row.into_order()?;
                let lines = self.fetch_lines(id).await?;
                Ok(Some(OrderWithLines { order, lines }))
            }
            None => Ok(None),
        }
    }

    async fn count(&self, status: Option<OrderStatus>) -> OrderResult<u64> {
        let count: i64 = match status {
            Some(status) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE status = $1")
                    .bind(status.as_str())
                    .fetch_one(&self.pool)
                    .await
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM orders")
                    .fetch_one(&self.pool)
                    .await
            }
        }
        .map_err(db_err)?;

        Ok(count as u64)
    }

    async fn find_page(
        &self,
        status: Option<OrderStatus>,
        skip: i64,
        take: i64,
    ) -> OrderResult<Vec<Order>> {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, OrderRow>(&format!(
                    "SELECT {ORDER_COLUMNS} FROM orders WHERE status = $1 \
                     ORDER BY created_at, id OFFSET $2 LIMIT $3"
                ))
                .bind(status.as_str())
                .bind(skip)
                .bind(take)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, OrderRow>(&format!(
                    "SELECT {ORDER_COLUMNS} FROM orders \
                     ORDER BY created_at, id OFFSET $1 LIMIT $2"
                ))
                .bind(skip)
                .bind(take)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(db_err)?;

        rows.into_iter().map(OrderRow::into_order).collect()
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
        new: OrderStatus,
    ) -> OrderResult<Order> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders SET status = $1, updated_at = NOW() \
             WHERE id = $2 AND status = $3 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(new.as_str())
        .bind(id)
        .bind(expected.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match row {
            Some(row) => row.into_order(),
            None => {
                // Zero rows: either the order vanished or someone else moved
                // its status after our read.
                let exists: Option<i32> = sqlx::query_scalar("SELECT 1 FROM orders WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(db_err)?;
                if exists.is_some() {
                    Err(OrderError::ConcurrentModification(id))
                } else {
                    Err(OrderError::NotFound(id))
                }
            }
        }
    }

    async fn settle_payment(
        &self,
        id: Uuid,
        payment_reference: &str,
        receipt_url: &str,
    ) -> OrderResult<OrderWithLines> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders SET status = 'PAID', paid = TRUE, paid_at = NOW(), \
             payment_reference = $2, receipt_url = $3, updated_at = NOW() \
             WHERE id = $1 AND paid = FALSE RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(payment_reference)
        .bind(receipt_url)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        match row {
            Some(row) => {
                sqlx::query(
                    "INSERT INTO order_receipts (id, order_id, receipt_url) VALUES ($1, $2, $3)",
                )
                .bind(Uuid::new_v4())
                .bind(id)
                .bind(receipt_url)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
                tx.commit().await.map_err(db_err)?;

                let order = row.into_order()?;
                let lines = self.fetch_lines(id).await?;
                Ok(OrderWithLines { order, lines })
            }
            None => {
                tx.rollback().await.map_err(db_err)?;
                // Already settled (possibly by a concurrent delivery of the
                // same event): return the stored order unchanged.
                self.find_by_id(id).await?.ok_or(OrderError::NotFound(id))
            }
        }
    }
}
