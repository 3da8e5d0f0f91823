use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use merx_core::error::{OrderError, OrderResult};

/// Order status in the payment/fulfillment lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Paid,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Parse the storage/wire representation back into the enum.
    pub fn parse(s: &str) -> OrderResult<Self> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "PAID" => Ok(OrderStatus::Paid),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(OrderError::Validation(format!(
                "unknown order status '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The order aggregate header. Line items live in [`OrderLine`] and are
/// created atomically with the header, immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub status: OrderStatus,
    pub paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    /// Sum of unit_price * quantity over all lines, fixed at creation.
    pub total_amount: i64,
    /// Sum of quantities over all lines, fixed at creation.
    pub total_items: i64,
    pub payment_reference: Option<String>,
    pub receipt_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// A fresh PENDING, unpaid order with totals from the price snapshot.
    pub fn new(total_amount: i64, total_items: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            status: OrderStatus::Pending,
            paid: false,
            paid_at: None,
            total_amount,
            total_items,
            payment_reference: None,
            receipt_url: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One line of an order. `unit_price` is the catalog price captured at
/// creation time; later catalog price changes never touch it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: i64,
}

/// Receipt recorded when a payment confirmation settles an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub id: Uuid,
    pub order_id: Uuid,
    pub receipt_url: String,
    pub created_at: DateTime<Utc>,
}

/// Repository read model: header plus its lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWithLines {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

/// A line enriched with the current catalog name. The name is a display-time
/// join, never stored; it is `None` when the catalog was unreachable during
/// a read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineWithProduct {
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: i64,
    pub product_name: Option<String>,
}

/// The order as returned to callers: header plus name-enriched lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWithProducts {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<LineWithProduct>,
}

/// Caller input for one requested line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub quantity: i32,
}

pub const DEFAULT_PAGE_LIMIT: i64 = 10;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Listing filter and pagination. `page` defaults to 1; `limit` defaults to
/// [`DEFAULT_PAGE_LIMIT`] and is capped at [`MAX_PAGE_LIMIT`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl OrderListQuery {
    /// Resolve defaults and reject non-positive values.
    pub fn normalize(&self) -> OrderResult<(i64, i64)> {
        let page = self.page.unwrap_or(1);
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if page < 1 {
            return Err(OrderError::Validation(format!(
                "page must be a positive integer, got {page}"
            )));
        }
        if limit < 1 {
            return Err(OrderError::Validation(format!(
                "limit must be a positive integer, got {limit}"
            )));
        }
        Ok((page, limit.min(MAX_PAGE_LIMIT)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMeta {
    /// Total number of orders matching the filter.
    pub total: u64,
    pub current_page: i64,
    /// ceil(total / limit); 0 when nothing matches.
    pub last_page: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPage {
    pub data: Vec<Order>,
    pub meta: PageMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_storage_form() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Paid,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(OrderStatus::parse("SHIPPED").is_err());
    }

    #[test]
    fn list_query_defaults_and_bounds() {
        let q = OrderListQuery::default();
        assert_eq!(q.normalize().unwrap(), (1, DEFAULT_PAGE_LIMIT));

        let q = OrderListQuery {
            limit: Some(10_000),
            ..Default::default()
        };
        assert_eq!(q.normalize().unwrap(), (1, MAX_PAGE_LIMIT));

        let q = OrderListQuery {
            page: Some(0),
            ..Default::default()
        };
        assert!(q.normalize().is_err());

        let q = OrderListQuery {
            limit: Some(-5),
            ..Default::default()
        };
        assert!(q.normalize().is_err());
    }

    #[test]
    fn new_order_starts_pending_and_unpaid() {
        let order = Order::new(2000, 2);
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(!order.paid);
        assert!(order.paid_at.is_none());
        assert_eq!(order.total_amount, 2000);
        assert_eq!(order.total_items, 2);
    }
}
