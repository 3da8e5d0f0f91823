//! Price snapshot construction.
//!
//! Combines the caller's requested (product, quantity) pairs with the
//! catalog's answer into priced order lines and aggregate totals. Pure and
//! deterministic; all I/O happens before this point.

use std::collections::HashMap;

use merx_core::catalog::CatalogProduct;
use merx_core::error::{OrderError, OrderResult};

use crate::models::{NewOrderItem, OrderLine};

/// Priced lines plus the derived totals persisted on the order header.
#[derive(Debug, Clone)]
pub struct PriceSnapshot {
    pub lines: Vec<OrderLine>,
    pub total_amount: i64,
    pub total_items: i64,
}

/// Build the snapshot for a creation request.
///
/// Any requested id absent from `products`, or present but unavailable, is
/// rejected with `UnknownProduct`; an order is never created against a
/// product that was not purchasable at creation time.
pub fn build_snapshot(
    items: &[NewOrderItem],
    products: &HashMap<i64, CatalogProduct>,
) -> OrderResult<PriceSnapshot> {
    let mut lines = Vec::with_capacity(items.len());
    let mut total_amount: i64 = 0;
    let mut total_items: i64 = 0;

    for item in items {
        if item.quantity <= 0 {
            return Err(OrderError::InvalidQuantity {
                product_id: item.product_id,
                quantity: item.quantity,
            });
        }

        let product = products
            .get(&item.product_id)
            .filter(|p| p.available)
            .ok_or(OrderError::UnknownProduct(item.product_id))?;

        total_amount = product
            .price
            .checked_mul(i64::from(item.quantity))
            .and_then(|line_amount| total_amount.checked_add(line_amount))
            .ok_or_else(|| {
                OrderError::Validation(format!(
                    "order total overflows for product {} with quantity {}",
                    item.product_id, item.quantity
                ))
            })?;
        total_items += i64::from(item.quantity);
        lines.push(OrderLine {
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: product.price,
        });
    }

    Ok(PriceSnapshot {
        lines,
        total_amount,
        total_items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: i64, price: i64, available: bool) -> CatalogProduct {
        let now = Utc::now();
        CatalogProduct {
            id,
            name: format!("Product {id}"),
            price,
            available,
            created_at: now,
            updated_at: now,
        }
    }

    fn catalog(products: Vec<CatalogProduct>) -> HashMap<i64, CatalogProduct> {
        products.into_iter().map(|p| (p.id, p)).collect()
    }

    #[test]
    fn totals_sum_over_all_lines() {
        let catalog = catalog(vec![product(1, 1000, true), product(2, 250, true)]);
        let items = vec![
            NewOrderItem { product_id: 1, quantity: 2 },
            NewOrderItem { product_id: 2, quantity: 4 },
        ];

        let snapshot = build_snapshot(&items, &catalog).unwrap();
        assert_eq!(snapshot.total_amount, 2 * 1000 + 4 * 250);
        assert_eq!(snapshot.total_items, 6);
        assert_eq!(snapshot.lines.len(), 2);
        assert_eq!(snapshot.lines[0].unit_price, 1000);
    }

    #[test]
    fn unit_price_is_the_catalog_price_at_build_time() {
        let catalog = catalog(vec![product(7, 499, true)]);
        let items = vec![NewOrderItem { product_id: 7, quantity: 1 }];

        let snapshot = build_snapshot(&items, &catalog).unwrap();
        assert_eq!(
            snapshot.lines[0],
            OrderLine { product_id: 7, quantity: 1, unit_price: 499 }
        );
    }

    #[test]
    fn missing_product_is_rejected() {
        let catalog = catalog(vec![product(1, 1000, true)]);
        let items = vec![
            NewOrderItem { product_id: 1, quantity: 1 },
            NewOrderItem { product_id: 99, quantity: 1 },
        ];

        match build_snapshot(&items, &catalog).unwrap_err() {
            OrderError::UnknownProduct(id) => assert_eq!(id, 99),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unavailable_product_is_rejected_like_a_missing_one() {
        let catalog = catalog(vec![product(3, 100, false)]);
        let items = vec![NewOrderItem { product_id: 3, quantity: 1 }];

        match build_snapshot(&items, &catalog).unwrap_err() {
            OrderError::UnknownProduct(id) => assert_eq!(id, 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn overflowing_total_is_rejected_not_wrapped() {
        let one_line = catalog(vec![product(1, i64::MAX / 2, true)]);
        let items = vec![NewOrderItem { product_id: 1, quantity: i32::MAX }];

        match build_snapshot(&items, &one_line).unwrap_err() {
            OrderError::Validation(msg) => assert!(msg.contains("overflows")),
            other => panic!("unexpected error: {other:?}"),
        }

        // Accumulation across lines is guarded too, not just one line.
        let two_lines = catalog(vec![
            product(1, i64::MAX - 1, true),
            product(2, i64::MAX - 1, true),
        ]);
        let items = vec![
            NewOrderItem { product_id: 1, quantity: 1 },
            NewOrderItem { product_id: 2, quantity: 1 },
        ];
        assert!(matches!(
            build_snapshot(&items, &two_lines).unwrap_err(),
            OrderError::Validation(_)
        ));
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let catalog = catalog(vec![product(1, 100, true)]);
        for quantity in [0, -2] {
            let items = vec![NewOrderItem { product_id: 1, quantity }];
            match build_snapshot(&items, &catalog).unwrap_err() {
                OrderError::InvalidQuantity { product_id, quantity: q } => {
                    assert_eq!(product_id, 1);
                    assert_eq!(q, quantity);
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }
}
